//! Turns positional tokens into typed, named arguments.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Write};

use bitcoin::Amount;
use serde_json::{json, Value};

use super::*;
use crate::registry::{CommandSpec, ParamKind};

/// Source of values for parameters missing from the command line
pub trait Prompt {
    /// Asks for a value. `None` means no answer can be obtained.
    fn ask(&mut self, label: &str) -> Result<Option<String>>;
}

/// Reads answers from stdin, one line each
pub struct Terminal;

impl Prompt for Terminal {
    fn ask(&mut self, label: &str) -> Result<Option<String>> {
        let mut stderr = io::stderr();
        stderr.write_all(label.as_bytes())?;
        stderr.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(Some(line))
    }
}

/// Never asks. Used when stdin is not a terminal or prompting is disabled.
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn ask(&mut self, label: &str) -> Result<Option<String>> {
        log::debug!("not prompting for {}", label.trim_end_matches(&[' ', '>'][..]));
        Ok(None)
    }
}

/// Answers from a fixed list, recording each label asked
#[derive(Debug, Default)]
pub struct Scripted {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl Scripted {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: vec![],
        }
    }
}

impl Prompt for Scripted {
    fn ask(&mut self, label: &str) -> Result<Option<String>> {
        self.asked.push(label.to_string());
        Ok(self.answers.pop_front())
    }
}

/// A parsed argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Number(u64),
    Amount(Amount),
    Flag(bool),
    List(Vec<String>),
}

impl ArgValue {
    /// Json form used as an rpc param. List items are parsed as json where possible.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => json!(s),
            Self::Number(n) => json!(n),
            Self::Amount(amt) => json!(amt.to_btc()),
            Self::Flag(b) => json!(b),
            Self::List(items) => Value::Array(items.iter().map(|s| loose_json(s)).collect()),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Amount(amt) => write!(f, "{}", amt.to_btc()),
            Self::Flag(b) => write!(f, "{b}"),
            Self::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

/// Parses `s` as json, or keeps it as a json string
pub fn loose_json(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

/// Arguments of one invocation, in declared order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedArgs {
    command: String,
    values: Vec<(&'static str, ArgValue)>,
}

impl ResolvedArgs {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            values: vec![],
        }
    }

    pub fn insert(&mut self, name: &'static str, value: ArgValue) {
        self.values.retain(|(n, _)| *n != name);
        self.values.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ArgValue)> {
        self.values.iter().map(|(n, v)| (*n, v))
    }

    pub(crate) fn missing(&self, name: &str) -> Error {
        Error::MissingParameter {
            command: self.command.clone(),
            param: name.to_string(),
        }
    }

    fn wrong_kind(&self, name: &str, v: &ArgValue, want: &str) -> Error {
        Error::invalid(name, &v.to_string(), format!("expected {want}"))
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(ArgValue::Text(s)) => Ok(s),
            Some(v) => Err(self.wrong_kind(name, v, "text")),
            None => Err(self.missing(name)),
        }
    }

    pub fn opt_text(&self, name: &str) -> Option<&str> {
        self.text(name).ok()
    }

    pub fn number(&self, name: &str) -> Result<u64> {
        match self.get(name) {
            Some(ArgValue::Number(n)) => Ok(*n),
            Some(v) => Err(self.wrong_kind(name, v, "a number")),
            None => Err(self.missing(name)),
        }
    }

    pub fn amount(&self, name: &str) -> Result<Amount> {
        match self.get(name) {
            Some(ArgValue::Amount(amt)) => Ok(*amt),
            Some(v) => Err(self.wrong_kind(name, v, "an amount")),
            None => Err(self.missing(name)),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.get(name) {
            Some(ArgValue::Flag(b)) => Ok(*b),
            Some(v) => Err(self.wrong_kind(name, v, "true or false")),
            None => Err(self.missing(name)),
        }
    }

    pub fn list(&self, name: &str) -> &[String] {
        match self.get(name) {
            Some(ArgValue::List(items)) => items,
            _ => &[],
        }
    }

    /// Values as positional rpc params. A trailing list is spread.
    pub fn to_params(&self) -> Vec<Value> {
        let mut params = vec![];
        for (_, v) in &self.values {
            match v {
                ArgValue::List(items) => params.extend(items.iter().map(|s| loose_json(s))),
                v => params.push(v.to_json()),
            }
        }
        params
    }
}

/// Fills the parameters of `spec` from `tokens`, asking `prompt` for missing required ones.
///
/// Tokens are trimmed; a blank token counts as absent. A required parameter that is still
/// blank after prompting fails with [`Error::MissingParameter`].
pub fn resolve(
    spec: &CommandSpec,
    tokens: &[String],
    prompt: &mut dyn Prompt,
) -> Result<ResolvedArgs> {
    let mut args = ResolvedArgs::new(spec.name);
    let mut tokens = tokens.iter();

    for p in &spec.params {
        if p.kind == ParamKind::Rest {
            let rest: Vec<String> = tokens.by_ref().cloned().collect();
            args.insert(p.name, ArgValue::List(rest));
            continue;
        }

        let raw = match tokens.next() {
            Some(token) => Some(token.clone()),
            None if p.required => prompt.ask(&p.label())?,
            None => None,
        };
        let raw = raw.as_deref().map(str::trim).unwrap_or_default();

        if !raw.is_empty() {
            args.insert(p.name, p.kind.parse(p.name, raw)?);
        } else if p.required {
            return Err(args.missing(p.name));
        } else if let Some(default) = p.default {
            args.insert(p.name, p.kind.parse(p.name, default)?);
        }
    }

    let extra = tokens.count();
    if extra > 0 {
        log::warn!("{}: ignoring {extra} extra argument(s)", spec.name);
    }
    Ok(args)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::registry::ParameterSpec;
    use crate::registry::COMMANDS;

    fn tokens(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn three_params() -> CommandSpec {
        CommandSpec::get("t", "/t")
            .param(ParameterSpec::text("a"))
            .param(ParameterSpec::text("b"))
            .param(ParameterSpec::number("c"))
    }

    #[test]
    fn prompts_only_for_missing_in_order() {
        let spec = three_params();
        let mut prompt = Scripted::new(["bee", "3"]);
        let args = resolve(&spec, &tokens(&["ay"]), &mut prompt).unwrap();
        assert_eq!(prompt.asked, ["b > ", "c > "]);
        assert_eq!(args.text("a").unwrap(), "ay");
        assert_eq!(args.text("b").unwrap(), "bee");
        assert_eq!(args.number("c").unwrap(), 3);
    }

    #[test]
    fn no_prompt_when_all_given() {
        let spec = three_params();
        let mut prompt = Scripted::default();
        resolve(&spec, &tokens(&["1", "2", "3"]), &mut prompt).unwrap();
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn empty_answer_is_missing_parameter() {
        let spec = COMMANDS.lookup("tgettx").unwrap().spec;
        let mut prompt = Scripted::new([""]);
        let err = resolve(spec, &[], &mut prompt).unwrap_err();
        assert_eq!(prompt.asked, ["txid > "]);
        match err {
            Error::MissingParameter { command, param } => {
                assert_eq!(command, "gettx");
                assert_eq!(param, "txid");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn whitespace_answer_is_missing_parameter() {
        let spec = three_params();
        let mut prompt = Scripted::new(["  \n"]);
        let err = resolve(&spec, &tokens(&["x"]), &mut prompt).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn non_interactive_fails_without_asking() {
        let spec = three_params();
        let err = resolve(&spec, &[], &mut NoPrompt).unwrap_err();
        assert!(matches!(err, Error::MissingParameter { ref param, .. } if param == "a"));
    }

    #[test]
    fn bad_number_is_validation_error() {
        let spec = COMMANDS.lookup("gettxoutspend").unwrap().spec;
        let err = resolve(spec, &tokens(&["abc", "two"]), &mut NoPrompt).unwrap_err();
        match err {
            Error::Validation { param, value, .. } => {
                assert_eq!(param, "vout");
                assert_eq!(value, "two");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn optional_params_are_not_prompted() {
        let spec = COMMANDS.lookup("getaddrchain").unwrap().spec;
        let mut prompt = Scripted::default();
        let args = resolve(spec, &tokens(&["bc1qaddr"]), &mut prompt).unwrap();
        assert!(prompt.asked.is_empty());
        assert!(args.get("txid").is_none());

        // a blank optional token is treated as absent
        let args = resolve(spec, &tokens(&["bc1qaddr", " "]), &mut prompt).unwrap();
        assert!(args.get("txid").is_none());
    }

    #[test]
    fn defaults_fill_optional() {
        let spec = CommandSpec::get("t", "/t")
            .param(ParameterSpec::text("address"))
            .param(ParameterSpec::number("nblocks").or("105"));
        let args = resolve(&spec, &tokens(&["addr"]), &mut NoPrompt).unwrap();
        assert_eq!(args.number("nblocks").unwrap(), 105);
        let args = resolve(&spec, &tokens(&["addr", "6"]), &mut NoPrompt).unwrap();
        assert_eq!(args.number("nblocks").unwrap(), 6);
    }

    #[test]
    fn rest_collects_remaining() {
        let spec = CommandSpec::get("t", "/t")
            .param(ParameterSpec::text("method"))
            .param(ParameterSpec::rest("params"));
        let argv = tokens(&["getblock", "\"00ff\"", "2", "addr"]);
        let args = resolve(&spec, &argv, &mut NoPrompt).unwrap();
        assert_eq!(args.list("params"), ["\"00ff\"", "2", "addr"]);
        assert_eq!(
            args.to_params(),
            vec![json!("getblock"), json!("00ff"), json!(2), json!("addr")]
        );

        let args = resolve(&spec, &tokens(&["getblockcount"]), &mut NoPrompt).unwrap();
        assert!(args.list("params").is_empty());
        assert_eq!(args.to_params(), vec![json!("getblockcount")]);
    }

    #[test]
    fn typed_getters_reject_wrong_kind() {
        let mut args = ResolvedArgs::new("x");
        args.insert("n", ArgValue::Text("7".into()));
        assert!(matches!(args.number("n"), Err(Error::Validation { .. })));
        assert!(matches!(args.text("missing"), Err(Error::MissingParameter { .. })));
    }

    #[test]
    fn amount_params_become_btc_numbers() {
        let mut args = ResolvedArgs::new("x");
        args.insert("address", ArgValue::Text("ert1q".into()));
        args.insert("amount", ArgValue::Amount(Amount::from_sat(150_000)));
        assert_eq!(args.to_params(), vec![json!("ert1q"), json!(0.0015)]);
    }
}
