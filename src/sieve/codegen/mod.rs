//! JavaScript code generation for Cloudflare Email Workers.
//!
//! The generated module exports `run({ message, env })`, which parses the
//! incoming message with postal-mime and then executes the script's rules
//! in order. Each top-level rule runs inside its own `try`/`catch` so one
//! failing rule cannot take down the whole routing.
//!
//! The input is the flat instruction list of a compiled script. Conditions
//! and `if`/`elsif`/`else` chains are recovered from its jumps: a test run
//! ends in a `Jz` past the branch, `allof`/`anyof` operands are joined by
//! `Jz`/`Jnz` into that final jump, and a branch with a successor ends in a
//! `Jmp` past the whole chain.

mod buffer;
mod value;

use buffer::{js_string, Buffer};
use value::{has_references, variable_key};

use super::error::CompileError;
use super::program::*;

/// Knobs for the generated worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOpts {
    /// Emit `console.log` traces for every action.
    pub debug: bool,
    /// Append the `export default { async email() }` Worker entry point.
    pub worker_entry: bool,
    /// Where `keep` forwards the message. Without it `keep` is a no-op.
    pub keep_address: Option<String>,
    /// Sender address for vacation replies when the script has no `:from`.
    pub vacation_from: Option<String>,
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self {
            debug: false,
            worker_entry: true,
            keep_address: None,
            vacation_from: None,
        }
    }
}

const STREAM_HELPER: &str = r#"async function streamToArrayBuffer(stream, streamSize) {
let result = new Uint8Array(streamSize);
let bytesRead = 0;
const reader = stream.getReader();
while (true) {
const { done, value } = await reader.read();
if (done) {
break;
}
result.set(value, bytesRead);
bytesRead += value.length;
}
return result;
}
"#;

const VALUE_HELPERS: &str = r#"function text(value) {
if (value === undefined || value === null) {
return "";
}
return String(value);
}

function fold(value) {
return text(value).toLowerCase();
}

function headerValues(parsed, name) {
const wanted = name.toLowerCase();
return parsed.headers.filter((header) => header.key === wanted).map((header) => header.value);
}

function addressList(parsed, field) {
const name = field.toLowerCase();
const value = parsed[name === "reply-to" ? "replyTo" : name];
if (!value) {
return [];
}
return [].concat(value).map((entry) => entry.address || "");
}

function addressPart(address, part) {
const at = address.lastIndexOf("@");
if (part === "localpart") {
return at === -1 ? address : address.slice(0, at);
}
if (part === "domain") {
return at === -1 ? "" : address.slice(at + 1);
}
return address;
}
"#;

const MODIFIER_HELPERS: &str = r#"function lowerFirst(value) {
return value.charAt(0).toLowerCase() + value.slice(1);
}

function upperFirst(value) {
return value.charAt(0).toUpperCase() + value.slice(1);
}

function quoteWildcard(value) {
return value.replace(/[*?\\]/g, "\\$&");
}

function quoteRegex(value) {
return value.replace(/[.*+?^${}()|[\]\\]/g, "\\$&");
}
"#;

const SPAMTEST_HELPER: &str = r#"async function spamScore(percent) {
const response = await env.AI.run("@cf/huggingface/distilbert-sst-2-int8", { text: text(parsedMessage.text) });
const negative = response.find((entry) => entry.label === "NEGATIVE");
const score = negative ? negative.score : 0;
return percent ? Math.round(score * 100) : Math.round(score * 9) + 1;
}
"#;

const WORKER_ENTRY: &str = r#"export default {
async email(message, env, ctx) {
await run({ message, env });
}
};
"#;

/// Runtime pieces the rules refer to. Only these end up in the prelude.
#[derive(Debug, Default)]
pub(crate) struct Needs {
    pub(crate) variables: bool,
    pub(crate) modifiers: bool,
    pub(crate) spam_score: bool,
    pub(crate) vacation: bool,
}

pub(crate) struct CodeGen<'a> {
    program: &'a [Instruction],
    buffer: Buffer,
    opts: &'a GenerateOpts,
    pub(crate) needs: Needs,
}

impl<'a> CodeGen<'a> {
    pub(crate) fn new(opts: &'a GenerateOpts, program: &'a [Instruction]) -> Self {
        Self {
            program,
            buffer: Buffer::new(),
            opts,
            needs: Needs::default(),
        }
    }

    pub(crate) fn generate_js(mut self) -> Result<String, CompileError> {
        // Rules first: they decide which helpers the prelude carries.
        let mut pos = 0;
        let mut rule = 0;
        while pos < self.program.len() {
            rule += 1;
            self.buffer.newline();
            self.buffer.line("try {");
            pos = self.statement(pos)?;
            self.buffer.line("} catch (err) {");
            self.buffer.line(&format!(
                "console.error(\"rule {rule} failed and has been skipped\", err);"
            ));
            self.buffer.line("}");
        }
        let rules = std::mem::replace(&mut self.buffer, Buffer::new()).to_string();

        self.buffer.line("import PostalMime from \"postal-mime\";");
        if self.needs.vacation {
            self.buffer
                .line("import { createMimeMessage } from \"mimetext\";");
            self.buffer
                .line("import { EmailMessage } from \"cloudflare:email\";");
        }
        self.buffer.newline();
        self.buffer.write(STREAM_HELPER);
        self.buffer.newline();
        self.buffer.write(VALUE_HELPERS);
        if self.needs.modifiers {
            self.buffer.newline();
            self.buffer.write(MODIFIER_HELPERS);
        }
        self.buffer.newline();

        self.buffer
            .line("export async function run({ message, env }) {");
        self.buffer.line("const extraHeaders = new Headers();");
        self.buffer
            .line("const raw = await streamToArrayBuffer(message.raw, message.rawSize);");
        self.buffer
            .line("const parsedMessage = await PostalMime.parse(raw);");

        if self.opts.debug {
            for field in ["headers", "to", "cc", "subject", "messageId", "from"] {
                self.buffer.line(&format!(
                    "console.log(\"parsedMessage {field}\", parsedMessage.{field});"
                ));
            }
        }

        if self.needs.variables {
            self.buffer.line("const variables = {};");
        }
        if self.needs.spam_score {
            self.buffer.newline();
            self.buffer.write(SPAMTEST_HELPER);
        }

        self.buffer.write(&rules);
        self.buffer.line("}");

        if self.opts.worker_entry {
            self.buffer.newline();
            self.buffer.write(WORKER_ENTRY);
        }

        Ok(self.buffer.to_string())
    }

    /// Statements in `[start, end)`.
    fn block(&mut self, start: usize, end: usize) -> Result<(), CompileError> {
        let mut pos = start;
        while pos < end {
            pos = self.statement(pos)?;
        }
        Ok(())
    }

    fn debug_trace(&mut self, what: &str) {
        if self.opts.debug {
            self.buffer.line(&format!("console.log({});", js_string(what)));
        }
    }

    /// Emit the statement starting at `pos` and return where the next one starts.
    fn statement(&mut self, pos: usize) -> Result<usize, CompileError> {
        let program = self.program;
        match &program[pos] {
            Instruction::Test(Test::Vacation(_)) => {
                // sieve-rs guards every vacation with its own test and jump.
                match (program.get(pos + 1), program.get(pos + 2)) {
                    (Some(Instruction::Jz(_)), Some(Instruction::Vacation(vacation))) => {
                        self.vacation(vacation)?;
                        Ok(pos + 3)
                    }
                    _ => Err(CompileError::unsupported(
                        "vacation cannot be used as a condition",
                    )),
                }
            }
            Instruction::Test(_) => self.if_chain(pos),
            Instruction::Stop => {
                self.debug_trace("stop");
                self.buffer.line("return;");
                Ok(pos + 1)
            }
            Instruction::Keep(_) => {
                self.debug_trace("keep");
                match &self.opts.keep_address {
                    Some(address) => self.buffer.line(&format!(
                        "await message.forward({}, extraHeaders);",
                        js_string(address)
                    )),
                    None => self.buffer.line("// keep the email"),
                }
                Ok(pos + 1)
            }
            Instruction::Discard => {
                self.debug_trace("discard");
                self.buffer.line("// discard the email");
                self.buffer.line("return;");
                Ok(pos + 1)
            }
            Instruction::FileInto(fileinto) => {
                self.fileinto(&fileinto.folder)?;
                Ok(pos + 1)
            }
            Instruction::Redirect(redirect) => {
                self.debug_trace("forward");
                let address = self.value(&redirect.address)?;
                self.buffer
                    .line(&format!("await message.forward({address}, extraHeaders);"));
                Ok(pos + 1)
            }
            Instruction::Reject(reject) => {
                self.debug_trace("reject");
                let reason = self.value(&reject.reason)?;
                self.buffer.line(&format!("message.setReject({reason});"));
                self.buffer.line("return;");
                Ok(pos + 1)
            }
            Instruction::Set(set) => {
                self.set(set)?;
                Ok(pos + 1)
            }
            Instruction::Clear(clear) => {
                let first = clear.local_vars_idx as usize;
                for slot in first..first + clear.local_vars_num as usize {
                    let key = variable_key(&VariableType::Local(slot))?;
                    self.buffer.line(&format!("delete variables[{key}];"));
                }
                Ok(pos + 1)
            }
            Instruction::AddHeader(add) => {
                let field = constant(&add.field_name, "addheader field names")?;
                if !field.to_ascii_lowercase().starts_with("x-") {
                    return Err(CompileError::unsupported(format!(
                        "header \"{field}\" cannot be added; only X- headers are allowed"
                    )));
                }
                let value = self.value(&add.value)?;
                self.buffer.line(&format!(
                    "extraHeaders.append({}, {value});",
                    js_string(&field)
                ));
                Ok(pos + 1)
            }
            Instruction::Vacation(vacation) => {
                self.vacation(vacation)?;
                Ok(pos + 1)
            }
            Instruction::Jmp(_) | Instruction::Jz(_) | Instruction::Jnz(_) => Err(
                CompileError::unsupported(format!("unexpected jump at instruction {pos}")),
            ),
        }
    }

    fn if_chain(&mut self, start: usize) -> Result<usize, CompileError> {
        let (jump, after) = self.final_jump(start)?;
        let cond = self.expression(start, jump)?;
        self.buffer.line(&format!("if ({cond}) {{"));
        let end = self.branches(jump, after)?;
        self.buffer.line("}");
        Ok(end)
    }

    /// The body after the jump at `jump` and whatever `elsif`/`else`
    /// follows it. Returns the end of the whole chain.
    fn branches(&mut self, jump: usize, after: usize) -> Result<usize, CompileError> {
        let Some(end) = self.chain_jump(jump, after) else {
            self.block(jump + 1, after)?;
            return Ok(after);
        };
        self.block(jump + 1, after - 1)?;

        if self.is_if_chain(after, end) {
            let (next_jump, next_after) = self.final_jump(after)?;
            let cond = self.expression(after, next_jump)?;
            self.buffer.line(&format!("}} else if ({cond}) {{"));
            self.branches(next_jump, next_after)?;
        } else {
            self.buffer.line("} else {");
            self.block(after, end)?;
        }
        Ok(end)
    }

    /// Target of the `Jmp` closing a branch that has a successor.
    fn chain_jump(&self, jump: usize, after: usize) -> Option<usize> {
        match self.program.get(after.checked_sub(1)?) {
            Some(Instruction::Jmp(end)) if after - 1 > jump && *end >= after => Some(*end),
            _ => None,
        }
    }

    /// True when `[start, end)` is exactly one `if` chain, so an `else`
    /// holding it can be written as `else if`.
    fn is_if_chain(&self, start: usize, end: usize) -> bool {
        if !matches!(self.program.get(start), Some(Instruction::Test(t)) if !matches!(t, Test::Vacation(_)))
        {
            return false;
        }
        match self.final_jump(start) {
            Ok((jump, after)) => self.chain_jump(jump, after).unwrap_or(after) == end,
            Err(_) => false,
        }
    }

    /// The `Jz` that closes the condition starting at `start`, and its target.
    /// Jumps between operands land on other jumps; the closing one does not.
    fn final_jump(&self, start: usize) -> Result<(usize, usize), CompileError> {
        for (at, instruction) in self.program.iter().enumerate().skip(start) {
            match instruction {
                Instruction::Jz(target) if *target > at && !self.is_conditional_jump(*target) => {
                    return Ok((at, *target));
                }
                Instruction::Test(_) | Instruction::Jz(_) | Instruction::Jnz(_) => {}
                _ => break,
            }
        }
        Err(CompileError::unsupported(format!(
            "condition at instruction {start} has no block"
        )))
    }

    fn is_conditional_jump(&self, at: usize) -> bool {
        matches!(
            self.program.get(at),
            Some(Instruction::Jz(_) | Instruction::Jnz(_))
        )
    }

    /// The boolean expression held in `[start, end)`, where `end` is the
    /// jump its operands short-circuit to.
    fn expression(&mut self, start: usize, end: usize) -> Result<String, CompileError> {
        let program = self.program;
        let connectives = (start..end)
            .filter_map(|at| match program[at] {
                Instruction::Jz(target) if target == end => Some((at, true)),
                Instruction::Jnz(target) if target == end => Some((at, false)),
                _ => None,
            })
            .collect::<Vec<_>>();

        let Some(&(_, all)) = connectives.first() else {
            return match &program[start..end] {
                [Instruction::Test(test)] => self.test(test),
                _ => Err(CompileError::unsupported(format!(
                    "malformed condition at instruction {start}"
                ))),
            };
        };

        // A trailing nested group of the other kind jumps to `end` too; it
        // is the last operand.
        let mut operands = Vec::new();
        let mut from = start;
        for (at, kind) in connectives {
            if kind != all {
                break;
            }
            operands.push(self.expression(from, at)?);
            from = at + 1;
        }
        operands.push(self.expression(from, end)?);

        let op = if all { " && " } else { " || " };
        Ok(operands
            .into_iter()
            .map(|o| format!("({o})"))
            .collect::<Vec<_>>()
            .join(op))
    }

    fn fileinto(&mut self, folder: &Value) -> Result<(), CompileError> {
        let folder = constant(folder, "fileinto destinations")?;
        let binding = folder.strip_prefix("r2://").ok_or_else(|| {
            CompileError::unsupported(format!(
                "fileinto destination must be an R2 bucket (r2://BINDING), got \"{folder}\""
            ))
        })?;
        let valid = binding
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && binding
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(CompileError::unsupported(format!(
                "invalid R2 binding name \"{binding}\""
            )));
        }

        self.buffer.line(&format!(
            "await env.{binding}.put((parsedMessage.messageId || crypto.randomUUID()) + \".eml\", raw);"
        ));
        self.debug_trace(&format!("stored email in {binding}"));
        Ok(())
    }

    fn set(&mut self, set: &Set) -> Result<(), CompileError> {
        self.needs.variables = true;
        let mut expr = format!("text({})", self.value(&set.value)?);
        for modifier in &set.modifiers {
            expr = match modifier {
                Modifier::Lower => format!("{expr}.toLowerCase()"),
                Modifier::Upper => format!("{expr}.toUpperCase()"),
                Modifier::LowerFirst => format!("lowerFirst({expr})"),
                Modifier::UpperFirst => format!("upperFirst({expr})"),
                Modifier::QuoteWildcard => format!("quoteWildcard({expr})"),
                Modifier::QuoteRegex => format!("quoteRegex({expr})"),
                Modifier::EncodeUrl => format!("encodeURIComponent({expr})"),
                Modifier::Length => format!("String({expr}.length)"),
                Modifier::Replace { find, replace } => format!(
                    "{expr}.split(text({})).join(text({}))",
                    self.value(find)?,
                    self.value(replace)?
                ),
            };
            if matches!(
                modifier,
                Modifier::LowerFirst
                    | Modifier::UpperFirst
                    | Modifier::QuoteWildcard
                    | Modifier::QuoteRegex
            ) {
                self.needs.modifiers = true;
            }
        }
        let key = variable_key(&set.name)?;
        self.buffer.line(&format!("variables[{key}] = {expr};"));
        Ok(())
    }

    fn vacation(&mut self, vacation: &Vacation) -> Result<(), CompileError> {
        let sender = match (&vacation.from, &self.opts.vacation_from) {
            (Some(from), _) => self.value(from)?,
            (None, Some(configured)) => js_string(configured),
            (None, None) => {
                return Err(CompileError::unsupported(
                    "vacation needs a sender address; pass :from or configure vacation_from",
                ));
            }
        };
        let subject = match &vacation.subject {
            Some(subject) => self.value(subject)?,
            None => js_string("Vacation auto-reply"),
        };
        let reason = self.value(&vacation.reason)?;
        self.needs.vacation = true;

        self.debug_trace("vacation reply");
        self.buffer.line("{");
        self.buffer.line("const msg = createMimeMessage();");
        self.buffer
            .line("msg.setHeader(\"In-Reply-To\", message.headers.get(\"Message-ID\"));");
        self.buffer.line(&format!(
            "msg.setSender({{ name: \"Vacation auto-reply\", addr: {sender} }});"
        ));
        self.buffer.line("msg.setRecipient(message.from);");
        self.buffer.line(&format!("msg.setSubject({subject});"));
        self.buffer.line(&format!(
            "msg.addMessage({{ contentType: \"text/plain\", data: {reason} }});"
        ));
        self.buffer.line(&format!(
            "const replyMessage = new EmailMessage({sender}, message.from, msg.asRaw());"
        ));
        self.buffer.line("await message.reply(replyMessage);");
        self.buffer.line("}");
        Ok(())
    }
}

/// Arguments that name bindings or headers are fixed when the worker is built.
fn constant(value: &Value, what: &str) -> Result<String, CompileError> {
    match value.as_text() {
        Some(text) if !has_references(value) => Ok(text),
        _ => Err(CompileError::unsupported(format!(
            "{what} cannot contain variable references"
        ))),
    }
}
