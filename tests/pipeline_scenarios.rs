//! End-to-end runs of the production pipeline: Sieve in, formatted worker out.

use sieveplay::demo::DEFAULT_SCRIPT;
use sieveplay::jsfmt::{self, FormatOptions};
use sieveplay::pipeline::{CompilePipeline, FaultOrigin};
use sieveplay::sieve::GenerateOpts;

fn run(source: &str) -> Result<String, sieveplay::pipeline::CompileFault> {
    CompilePipeline::sieve(GenerateOpts::default()).run(source)
}

#[test]
fn demo_compiles_to_a_worker_module() {
    let code = run(DEFAULT_SCRIPT).unwrap();
    assert!(code.starts_with("import PostalMime from \"postal-mime\"\n"));
    assert!(code.contains("export async function run({ message, env }) {"));
    assert!(code.contains("const variables = {}"));
    assert!(code.contains("await env.BINDING_NAME.put("));
    assert!(code.contains("export default {\n  async email(message, env, ctx) {\n    await run({ message, env })\n  },\n}\n"));
}

#[test]
fn make_money_fast_is_dropped() {
    let code = run("require \"body\";\nif body :contains \"MAKE MONEY FAST\" { discard; }").unwrap();
    let check = code
        .lines()
        .position(|l| l.trim_start().starts_with("if (") && l.contains("MAKE MONEY FAST"))
        .expect("an if that checks the body");
    assert!(code.lines().nth(check).unwrap().contains("parsedMessage.text"));
    let body: Vec<&str> = code.lines().skip(check + 1).take(2).map(str::trim).collect();
    assert_eq!(body, ["// discard the email", "return"]);
}

#[test]
fn missing_require_cites_variables() {
    let without_require: String = DEFAULT_SCRIPT
        .lines()
        .filter(|l| !l.trim_start().starts_with("require"))
        .collect::<Vec<_>>()
        .join("\n");
    let fault = run(&without_require).unwrap_err();
    assert_eq!(fault.origin, FaultOrigin::Input);
    assert!(fault.message.contains("variables"), "{}", fault.message);
}

#[test]
fn unterminated_string_is_a_fault() {
    let fault = run("if header :contains \"subject\" \"free money { discard; }").unwrap_err();
    assert_eq!(fault.origin, FaultOrigin::Input);
    assert!(fault.message.contains("Unterminated string"), "{}", fault.message);
    assert!(fault.request.is_none());
}

#[test]
fn unsupported_commands_are_input_faults() {
    let fault = run("require \"editheader\";\ndeleteheader \"x-a\";").unwrap_err();
    assert_eq!(fault.origin, FaultOrigin::Input);
    assert!(fault.message.contains("\"deleteheader\""), "{}", fault.message);
}

#[test]
fn runs_are_deterministic() {
    let first = run(DEFAULT_SCRIPT).unwrap();
    let second = run(DEFAULT_SCRIPT).unwrap();
    assert_eq!(first, second);
}

#[test]
fn artifacts_are_format_stable() {
    let corpus = [
        DEFAULT_SCRIPT,
        "",
        "keep;",
        "require [\"fileinto\", \"copy\"];\nfileinto :copy \"r2://ARCHIVE\";\nstop;",
        "if size :over 1M { discard; } elsif exists \"x-spam\" { redirect \"ops@example.com\"; } else { keep; }",
        "require \"reject\";\nif address :domain :is \"from\" \"spam.example\" { reject \"go away\"; }",
        "require [\"editheader\", \"variables\"];\nset :upper \"tag\" \"seen\";\naddheader \"x-tag\" \"${tag}\";",
        "require [\"vacation\"];\nvacation :days 3 :subject \"Away\" :from \"me@example.com\" \"Back soon.\";",
        "require \"envelope\";\nif envelope :all :is \"from\" \"boss@example.com\" { keep; }",
        "if not anyof (header :matches \"subject\" \"*sale*\", true) { stop; }",
        "if allof (exists \"x-a\", anyof (size :over 1K, false)) { stop; } elsif true { keep; }",
    ];
    let options = FormatOptions::worker();
    for script in corpus {
        let code = run(script).unwrap_or_else(|f| panic!("{script:?}: {}", f.message));
        let again = jsfmt::format(&code, &options).unwrap();
        assert_eq!(code, again, "not stable for {script:?}");
    }
}

#[test]
fn worker_entry_can_be_left_out() {
    let opts = GenerateOpts {
        worker_entry: false,
        ..GenerateOpts::default()
    };
    let code = CompilePipeline::sieve(opts).run("keep;").unwrap();
    assert!(!code.contains("export default"));
}

#[test]
fn keep_forwards_when_configured() {
    let opts = GenerateOpts {
        keep_address: Some("inbox@example.com".into()),
        ..GenerateOpts::default()
    };
    let code = CompilePipeline::sieve(opts).run("keep;").unwrap();
    assert!(code.contains("await message.forward(\"inbox@example.com\", extraHeaders)"));
}
