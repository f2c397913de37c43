//! Register, stack and architecture introspection.

use std::fmt;

use indexmap::IndexMap;

use crate::ack::first_line;
use crate::classify::normalize_address;
use crate::error::{SessionError, SessionResult};
use crate::session::Session;

/// One register value as reported by `info registers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    name: String,
    value: String,
}

impl Register {
    /// Create a register entry. `value` is normalised `0x` hex.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Register name, e.g. `rip`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register value, e.g. `0x401126`.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<register name={} value={}>", self.name, self.value)
    }
}

/// Registers keyed by name, in the order the debugger listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterSet {
    registers: IndexMap<String, Register>,
}

impl RegisterSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a register, keeping its first position.
    pub fn insert(&mut self, register: Register) {
        self.registers.insert(register.name.clone(), register);
    }

    /// Look up a register by name.
    pub fn get(&self, name: &str) -> Option<&Register> {
        self.registers.get(name)
    }

    /// Iterate in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.registers.values()
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// Returns `true` when no register matched.
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

/// A word read from the stack frame by `x/x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackWord {
    digits: String,
}

impl StackWord {
    /// Wrap the hex digits exactly as displayed (no `0x` prefix).
    pub fn new(digits: impl Into<String>) -> Self {
        Self {
            digits: digits.into(),
        }
    }

    /// Normalised `0x` hex value.
    pub fn value(&self) -> String {
        normalize_address(&self.digits).unwrap_or_else(|| format!("0x{}", self.digits))
    }

    /// The displayed digits decoded pairwise into bytes, most significant
    /// first. An odd digit count is padded with a leading zero.
    pub fn raw(&self) -> Vec<u8> {
        let padded = if self.digits.len() % 2 == 1 {
            format!("0{}", self.digits)
        } else {
            self.digits.clone()
        };
        padded
            .as_bytes()
            .chunks(2)
            .filter_map(|pair| {
                std::str::from_utf8(pair)
                    .ok()
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            })
            .collect()
    }
}

impl Session {
    /// Run `info registers` and collect every register line.
    ///
    /// Registers the output does not mention are simply absent.
    pub fn get_registers(&mut self) -> SessionResult<RegisterSet> {
        let unit = self.execute("info registers")?;
        Ok(self.acks().registers(&unit))
    }

    /// Examine the word at `$ebp-<offset>`. `None` when the reply holds no
    /// examine line.
    pub fn get_stack(&mut self, offset: i64) -> SessionResult<Option<StackWord>> {
        let unit = self.execute(&format!("x/x $ebp-{offset}"))?;
        Ok(self.acks().stack_word(&unit).map(StackWord::new))
    }

    /// Overwrite the `int` at `$ebp-<offset>`.
    pub fn set_stack(&mut self, offset: i64, value: impl fmt::Display) -> SessionResult<String> {
        self.execute(&format!("set {{int}} ($ebp-{offset}) = {value}"))
    }

    /// Query the target architecture.
    pub fn get_architecture(&mut self) -> SessionResult<String> {
        let unit = self.execute("show architecture")?;
        self.acks()
            .architecture(&unit)
            .ok_or_else(|| SessionError::UnrecognizedArchitecture(first_line(&unit)))
    }

    /// Force the target architecture.
    pub fn set_architecture(&mut self, architecture: &str) -> SessionResult<String> {
        let unit = self.execute(&format!("set architecture {architecture}"))?;
        if self.acks().architecture_set(&unit) {
            Ok(unit)
        } else {
            Err(SessionError::UnrecognizedArchitecture(first_line(&unit)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;
    use crate::transport::ScriptedTransport;

    fn session_with(replies: &[&str]) -> (Session, ScriptedTransport) {
        let transport = ScriptedTransport::new();
        for reply in replies {
            transport.queue_reply(reply);
        }
        let session = Session::new(transport.clone(), SessionOptions::default())
            .unwrap()
            .with_echo(std::io::sink());
        (session, transport)
    }

    #[test]
    fn inspect_get_registers() {
        let (mut session, transport) = session_with(&[
            "eax            0xbffff6c4          -1073744188\neip            0x8048456           0x8048456 <main+6>\n(gdb) ",
        ]);
        let registers = session.get_registers().unwrap();
        assert_eq!(transport.commands(), vec!["info registers"]);
        assert_eq!(registers.len(), 2);
        assert_eq!(registers.get("eip").unwrap().value(), "0x8048456");
        assert!(registers.get("esp").is_none());
    }

    #[test]
    fn inspect_register_display() {
        let register = Register::new("eax", "0x1");
        assert_eq!(register.to_string(), "<register name=eax value=0x1>");
    }

    #[test]
    fn inspect_register_set_keeps_first_position_on_replace() {
        let mut set = RegisterSet::new();
        set.insert(Register::new("a", "0x1"));
        set.insert(Register::new("b", "0x2"));
        set.insert(Register::new("a", "0x3"));
        let listed: Vec<(&str, &str)> = set.iter().map(|r| (r.name(), r.value())).collect();
        assert_eq!(listed, vec![("a", "0x3"), ("b", "0x2")]);
    }

    #[test]
    fn inspect_get_stack_value_and_raw() {
        let (mut session, transport) = session_with(&["0xbffff6c8:\t0x08048456\n(gdb) "]);
        let word = session.get_stack(12).unwrap().unwrap();
        assert_eq!(transport.commands(), vec!["x/x $ebp-12"]);
        assert_eq!(word.value(), "0x8048456");
        assert_eq!(word.raw(), vec![0x08, 0x04, 0x84, 0x56]);
    }

    #[test]
    fn inspect_get_stack_absent() {
        let (mut session, _) = session_with(&["No registers.\n(gdb) "]);
        assert_eq!(session.get_stack(4).unwrap(), None);
    }

    #[test]
    fn inspect_stack_word_odd_digit_count() {
        assert_eq!(StackWord::new("abc").raw(), vec![0x0a, 0xbc]);
    }

    #[test]
    fn inspect_set_stack_command() {
        let (mut session, transport) = session_with(&["(gdb) "]);
        session.set_stack(8, 0x41414141).unwrap();
        assert_eq!(transport.commands(), vec!["set {int} ($ebp-8) = 1094795585"]);
    }

    #[test]
    fn inspect_get_architecture() {
        let (mut session, _) = session_with(&[
            "The target architecture is set automatically (currently i386)\n(gdb) ",
        ]);
        assert_eq!(session.get_architecture().unwrap(), "i386");
    }

    #[test]
    fn inspect_get_architecture_unrecognized() {
        let (mut session, _) = session_with(&["Something else entirely\n(gdb) "]);
        let err = session.get_architecture().unwrap_err();
        assert!(
            matches!(err, SessionError::UnrecognizedArchitecture(ref line) if line == "Something else entirely")
        );
    }

    #[test]
    fn inspect_set_architecture() {
        let (mut session, transport) = session_with(&[
            "The target architecture is assumed to be i386:x86-64\n(gdb) ",
            "Undefined item: \"z80\".\n(gdb) ",
        ]);
        assert!(session.set_architecture("i386:x86-64").is_ok());
        let err = session.set_architecture("z80").unwrap_err();
        assert!(matches!(err, SessionError::UnrecognizedArchitecture(ref line) if line == "Undefined item: \"z80\"."));
        assert_eq!(
            transport.commands(),
            vec!["set architecture i386:x86-64", "set architecture z80"]
        );
    }
}
