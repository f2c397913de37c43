//! Acknowledgement grammars.
//!
//! These read the synchronous reply to a specific command. They run on the
//! same response unit as event classification but independently of it.

use regex::Regex;

use crate::classify::normalize_address;
use crate::inspect::{Register, RegisterSet};

/// The debugger's answer to a breakpoint-set command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakpointAck {
    /// `Breakpoint N at 0xADDR`
    Resolved {
        /// Breakpoint number.
        id: String,
        /// Normalised address.
        address: String,
    },
    /// `Breakpoint N (...) pending.`
    Pending {
        /// Breakpoint number.
        id: String,
    },
}

/// Compiled patterns for command acknowledgements.
#[derive(Debug)]
pub struct AckParser {
    breakpoint_resolved: Regex,
    breakpoint_pending: Regex,
    register_line: Regex,
    stack_word: Regex,
    architecture_assumed: Regex,
    architecture_auto: Regex,
}

/// Prefix of a successful `set architecture` reply.
pub const ARCHITECTURE_SET_PREFIX: &str = "The target architecture is assumed to be";

impl AckParser {
    /// Create a parser with the GDB console grammars.
    pub fn new() -> Self {
        Self {
            breakpoint_resolved: Regex::new(r"Breakpoint (\d+) at 0x([\da-f]+)")
                .expect("breakpoint resolved regex is valid"),
            breakpoint_pending: Regex::new(r"Breakpoint (\d+) (.*?) pending\.")
                .expect("breakpoint pending regex is valid"),
            register_line: Regex::new(r"(\S+)\s+0x([a-f\d]+)\s")
                .expect("register line regex is valid"),
            stack_word: Regex::new(r"0x[\da-f]+.*:\s+0x([\da-f]+)")
                .expect("stack word regex is valid"),
            architecture_assumed: Regex::new(r"The target architecture is assumed to be (.*)")
                .expect("architecture assumed regex is valid"),
            architecture_auto: Regex::new(
                r"The target architecture is set automatically \(currently (.*?)\)",
            )
            .expect("architecture auto regex is valid"),
        }
    }

    /// Parse a breakpoint-set reply. A resolved acknowledgement wins over a
    /// pending one.
    pub fn breakpoint(&self, unit: &str) -> Option<BreakpointAck> {
        if let Some(caps) = self.breakpoint_resolved.captures(unit) {
            if let Some(address) = normalize_address(&caps[2]) {
                return Some(BreakpointAck::Resolved {
                    id: caps[1].to_string(),
                    address,
                });
            }
        }
        self.breakpoint_pending
            .captures(unit)
            .map(|caps| BreakpointAck::Pending {
                id: caps[1].to_string(),
            })
    }

    /// Collect every `name 0xVALUE` line of an `info registers` reply, in
    /// order. Lines that do not match are skipped.
    pub fn registers(&self, unit: &str) -> RegisterSet {
        let mut registers = RegisterSet::new();
        for line in unit.lines() {
            let Some(caps) = self.register_line.captures(line) else {
                continue;
            };
            if let Some(value) = normalize_address(&caps[2]) {
                registers.insert(Register::new(&caps[1], value));
            }
        }
        registers
    }

    /// Hex digits of the first word in an `x/x` examine reply.
    pub fn stack_word<'a>(&self, unit: &'a str) -> Option<&'a str> {
        self.stack_word
            .captures(unit)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Architecture name from a `show architecture` reply.
    pub fn architecture(&self, unit: &str) -> Option<String> {
        self.architecture_assumed
            .captures(unit)
            .or_else(|| self.architecture_auto.captures(unit))
            .map(|caps| caps[1].trim_end_matches('.').trim().to_string())
    }

    /// Whether a `set architecture` reply confirms the change.
    pub fn architecture_set(&self, unit: &str) -> bool {
        unit.starts_with(ARCHITECTURE_SET_PREFIX)
    }
}

impl Default for AckParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The first line of a response unit, used as failure detail.
pub fn first_line(unit: &str) -> String {
    unit.lines().next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_breakpoint_resolved() {
        let ack = AckParser::new()
            .breakpoint("Breakpoint 1 at 0x4005d6: file demo.c, line 4.\n(gdb) ")
            .unwrap();
        assert_eq!(
            ack,
            BreakpointAck::Resolved {
                id: "1".into(),
                address: "0x4005d6".into(),
            }
        );
    }

    #[test]
    fn ack_breakpoint_pending() {
        let unit = "Function \"foo\" not defined.\nBreakpoint 2 (foo) pending.\n(gdb) ";
        let ack = AckParser::new().breakpoint(unit).unwrap();
        assert_eq!(ack, BreakpointAck::Pending { id: "2".into() });
    }

    #[test]
    fn ack_breakpoint_unrecognized() {
        let unit = "No symbol table is loaded.  Use the \"file\" command.\n(gdb) ";
        assert!(AckParser::new().breakpoint(unit).is_none());
    }

    #[test]
    fn ack_registers_in_order() {
        let unit = "rax            0x1c                28\n\
                    rbx            0x0                 0\n\
                    rip            0x401126            0x401126 <main+4>\n\
                    eflags         0x246               [ IF ZF PF ]\n(gdb) ";
        let registers = AckParser::new().registers(unit);
        let names: Vec<&str> = registers.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["rax", "rbx", "rip", "eflags"]);
        assert_eq!(registers.get("rip").unwrap().value(), "0x401126");
        assert_eq!(registers.get("rax").unwrap().value(), "0x1c");
    }

    #[test]
    fn ack_registers_missing_lines_are_absent() {
        let registers = AckParser::new().registers("The program has no registers now.\n(gdb) ");
        assert!(registers.is_empty());
    }

    #[test]
    fn ack_stack_word() {
        let parser = AckParser::new();
        assert_eq!(
            parser.stack_word("0xbffff6c8:\t0x08048456\n(gdb) "),
            Some("08048456")
        );
        assert_eq!(
            parser.stack_word("0xbffff6c8 <buf+4>:\t0x41414141\n(gdb) "),
            Some("41414141")
        );
        assert_eq!(parser.stack_word("No registers.\n(gdb) "), None);
    }

    #[test]
    fn ack_architecture_variants() {
        let parser = AckParser::new();
        assert_eq!(
            parser
                .architecture("The target architecture is assumed to be i386\n(gdb) ")
                .as_deref(),
            Some("i386")
        );
        assert_eq!(
            parser
                .architecture(
                    "The target architecture is set automatically (currently i386:x86-64)\n(gdb) "
                )
                .as_deref(),
            Some("i386:x86-64")
        );
        assert_eq!(parser.architecture("Huh?\n(gdb) "), None);
    }

    #[test]
    fn ack_architecture_set_prefix() {
        let parser = AckParser::new();
        assert!(parser.architecture_set("The target architecture is assumed to be arm\n(gdb) "));
        assert!(!parser.architecture_set("Undefined item: \"z80\".\n(gdb) "));
    }

    #[test]
    fn first_line_of_unit() {
        assert_eq!(first_line("one\ntwo\n"), "one");
        assert_eq!(first_line(""), "");
    }
}
