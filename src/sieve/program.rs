//! The compiled script as a flat instruction list.
//!
//! sieve-rs keeps its grammar types crate-private but serializes a compiled
//! [`sieve::Sieve`](::sieve::Sieve) with serde, so the instruction stream is
//! read back into the mirrors below. Only the fields the worker backend
//! reads are declared; serde skips the rest.
//!
//! Control flow stays in jump form: `if` is a run of [`Test`]s closed by a
//! `Jz` past the block, `allof`/`anyof` join their tests with `Jz`/`Jnz`
//! into that final jump, and a branch followed by `elsif`/`else` ends in a
//! `Jmp` past the whole chain.

use serde::Deserialize;
use serde_json::Value as Json;

use super::error::CompileError;

/// Instructions the worker backend knows how to emit.
const SUPPORTED: &[&str] = &[
    "Keep",
    "FileInto",
    "Redirect",
    "Discard",
    "Stop",
    "Test",
    "Jmp",
    "Jz",
    "Jnz",
    "AddHeader",
    "Set",
    "Clear",
    "Reject",
    "Vacation",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Parse and compile `source` with sieve-rs.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let compiled = ::sieve::Compiler::new().compile(source.as_bytes())?;
        Self::decode(&compiled)
    }

    pub fn decode(compiled: &::sieve::Sieve) -> Result<Self, CompileError> {
        let tree = serde_json::to_value(compiled)
            .map_err(|e| CompileError::unsupported(format!("unreadable compiled script: {e}")))?;
        let Some(Json::Array(raw)) = tree.get("instructions") else {
            return Err(CompileError::unsupported(
                "compiled script has no instruction list",
            ));
        };
        let instructions = raw
            .iter()
            .map(decode_instruction)
            .collect::<Result<_, _>>()?;
        Ok(Self { instructions })
    }
}

fn decode_instruction(raw: &Json) -> Result<Instruction, CompileError> {
    Instruction::deserialize(raw).map_err(|_| {
        let (outer, name) = command_name(raw);
        if SUPPORTED.contains(&outer.as_str()) && outer != "Test" {
            CompileError::unsupported(format!(
                "{name} uses an argument email workers cannot provide"
            ))
        } else {
            CompileError::unsupported(format!("{name} is not supported in email workers"))
        }
    })
}

/// The serde tag of an instruction and the Sieve keyword it stands for.
/// Tests are named after the test rather than the `Test` wrapper.
fn command_name(raw: &Json) -> (String, String) {
    let tag = |value: &Json| match value {
        Json::String(tag) => Some(tag.clone()),
        Json::Object(map) => map.keys().next().cloned(),
        _ => None,
    };
    let outer = tag(raw).unwrap_or_default();
    let inner = if outer == "Test" {
        raw.get("Test").and_then(tag)
    } else {
        None
    };
    let keyword = inner.unwrap_or_else(|| outer.clone()).to_ascii_lowercase();
    (outer, format!("\"{keyword}\""))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Instruction {
    Keep(Keep),
    FileInto(FileInto),
    Redirect(Redirect),
    Discard,
    Stop,
    Test(Test),
    Jmp(usize),
    Jz(usize),
    Jnz(usize),
    AddHeader(AddHeader),
    Set(Set),
    Clear(Clear),
    Reject(Reject),
    Vacation(Vacation),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Keep {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileInto {
    pub folder: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Redirect {
    pub address: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reject {
    pub reason: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddHeader {
    pub field_name: Value,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Set {
    /// Already in application order.
    pub modifiers: Vec<Modifier>,
    pub name: VariableType,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Modifier {
    Lower,
    Upper,
    LowerFirst,
    UpperFirst,
    QuoteWildcard,
    QuoteRegex,
    EncodeUrl,
    Length,
    Replace { find: Value, replace: Value },
}

/// End of a block: the block's local variables go out of scope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Clear {
    pub local_vars_idx: u32,
    pub local_vars_num: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Vacation {
    pub subject: Option<Value>,
    pub from: Option<Value>,
    pub reason: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Test {
    True,
    False,
    Address(TestAddress),
    Envelope(TestEnvelope),
    Exists(TestExists),
    Header(TestHeader),
    Size(TestSize),
    Body(TestBody),
    String(TestString),
    SpamTest(TestSpamTest),
    /// Guard in front of every `vacation` action.
    Vacation(TestVacation),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestAddress {
    pub header_list: Vec<Value>,
    pub key_list: Vec<Value>,
    pub address_part: AddressPart,
    pub match_type: MatchType,
    pub comparator: Comparator,
    pub is_not: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestEnvelope {
    pub envelope_list: Vec<Envelope>,
    pub key_list: Vec<Value>,
    pub address_part: AddressPart,
    pub match_type: MatchType,
    pub comparator: Comparator,
    pub is_not: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestExists {
    pub header_names: Vec<Value>,
    pub is_not: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestHeader {
    pub header_list: Vec<Value>,
    pub key_list: Vec<Value>,
    pub match_type: MatchType,
    pub comparator: Comparator,
    pub is_not: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestSize {
    pub over: bool,
    pub limit: usize,
    pub is_not: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestBody {
    pub key_list: Vec<Value>,
    pub body_transform: BodyTransform,
    pub match_type: MatchType,
    pub comparator: Comparator,
    pub is_not: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestString {
    pub match_type: MatchType,
    pub comparator: Comparator,
    pub source: Vec<Value>,
    pub key_list: Vec<Value>,
    pub is_not: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestSpamTest {
    pub value: Value,
    pub match_type: MatchType,
    pub comparator: Comparator,
    pub percent: bool,
    pub is_not: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestVacation {}

impl Test {
    pub fn is_not(&self) -> bool {
        match self {
            Test::True | Test::False | Test::Vacation(_) => false,
            Test::Address(t) => t.is_not,
            Test::Envelope(t) => t.is_not,
            Test::Exists(t) => t.is_not,
            Test::Header(t) => t.is_not,
            Test::Size(t) => t.is_not,
            Test::Body(t) => t.is_not,
            Test::String(t) => t.is_not,
            Test::SpamTest(t) => t.is_not,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Value {
    Text(String),
    Number(Number),
    Variable(VariableType),
    Regex(String),
    /// Interpolated string, concatenated in order.
    List(Vec<Value>),
}

impl Value {
    /// The value when it is a constant string.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Text(text) | Value::Regex(text) => Some(text.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Variable(_) | Value::List(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{n}"),
            Number::Float(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum VariableType {
    /// Slot of a `set` variable; names are resolved away by the compiler.
    Local(usize),
    /// `${1}` style capture of the last `:matches`.
    Match(usize),
    Global(String),
    Environment(String),
    Envelope(Envelope),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Envelope {
    From,
    To,
    ByTimeAbsolute,
    ByTimeRelative,
    ByMode,
    ByTrace,
    Notify,
    Orcpt,
    Ret,
    Envid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AddressPart {
    LocalPart,
    Domain,
    All,
    User,
    Detail,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MatchType {
    Is,
    Contains,
    Matches(u64),
    Regex(u64),
    Value(RelationalMatch),
    Count(RelationalMatch),
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RelationalMatch {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl RelationalMatch {
    pub fn js_operator(self) -> &'static str {
        match self {
            RelationalMatch::Gt => ">",
            RelationalMatch::Ge => ">=",
            RelationalMatch::Lt => "<",
            RelationalMatch::Le => "<=",
            RelationalMatch::Eq => "===",
            RelationalMatch::Ne => "!==",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Comparator {
    Elbonia,
    Octet,
    AsciiCaseMap,
    AsciiNumeric,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum BodyTransform {
    Raw,
    Content(Vec<Value>),
    Text,
}
