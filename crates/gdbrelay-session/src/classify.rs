//! Output classification.
//!
//! Turns a response unit into the asynchronous events it announces. Each
//! announcement kind has its own named matcher; the result is a tagged
//! [`Event`] so nothing downstream inspects raw text again.

use regex::Regex;

use crate::signal::Signal;

/// A structured notification found in a response unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Execution stopped at a breakpoint.
    BreakpointHit {
        /// Debugger-assigned breakpoint number.
        id: String,
        /// Stop address, normalised to lowercase `0x` hex.
        address: String,
        /// Function / location description.
        context: String,
    },
    /// The inferior received a signal.
    SignalTrapped {
        /// The signal that stopped the inferior.
        signal: Signal,
        /// Stop address, normalised to lowercase `0x` hex.
        address: String,
        /// Function / location description.
        context: String,
    },
}

/// Why a line that looked like an announcement produced no event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// Looked like a breakpoint hit but lacked an address or location.
    MalformedBreakpointHit,
    /// A signal report whose follow-up stop line did not parse.
    MalformedSignalReport,
    /// A signal report naming a signal outside the known set.
    UnknownSignal(String),
}

/// A line skipped during classification. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationMiss {
    /// The offending line, without its terminator.
    pub line: String,
    /// What went wrong.
    pub reason: MissReason,
}

/// Everything classification found in one response unit, in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Events to dispatch.
    pub events: Vec<Event>,
    /// Announcements that could not be parsed.
    pub misses: Vec<ClassificationMiss>,
}

const BREAKPOINT_PREFIX: &str = "Breakpoint";
const SIGNAL_PREFIX: &str = "Program received signal";

/// Scans response units for breakpoint hits and signal reports.
#[derive(Debug)]
pub struct Classifier {
    breakpoint_hit: Regex,
    breakpoint_announcement: Regex,
    signal_report: Regex,
}

impl Classifier {
    /// Create a classifier with the GDB console grammars.
    pub fn new() -> Self {
        Self {
            breakpoint_hit: Regex::new(r"^Breakpoint (\d+), 0x([\da-f]+) in (.*)$")
                .expect("breakpoint hit regex is valid"),
            breakpoint_announcement: Regex::new(r"^Breakpoint \d+, ")
                .expect("breakpoint announcement regex is valid"),
            signal_report: Regex::new(
                r"^Program received signal ([A-Z][A-Z0-9]*), [^\n]*\n0x([\da-f]+) in ([^\r\n]+)\r?\n",
            )
            .expect("signal report regex is valid"),
        }
    }

    /// Classify one response unit.
    ///
    /// Lines are examined in order. A signal report spans two lines, so its
    /// pattern is matched against the unit starting at the report line.
    pub fn classify(&self, unit: &str) -> Classification {
        let mut classification = Classification::default();
        let mut offset = 0;

        for raw_line in unit.split_inclusive('\n') {
            let start = offset;
            offset += raw_line.len();
            let line = raw_line.trim_end_matches(['\r', '\n']);

            let outcome = if line.starts_with(BREAKPOINT_PREFIX) {
                self.match_breakpoint_hit(line)
            } else if line.starts_with(SIGNAL_PREFIX) {
                Some(self.match_signal_report(&unit[start..]))
            } else {
                None
            };

            match outcome {
                Some(Ok(event)) => classification.events.push(event),
                Some(Err(reason)) => classification.misses.push(ClassificationMiss {
                    line: line.to_string(),
                    reason,
                }),
                None => {}
            }
        }

        classification
    }

    /// Returns `None` for inert lines such as `Breakpoint 1 at 0x...`
    /// acknowledgements.
    fn match_breakpoint_hit(&self, line: &str) -> Option<Result<Event, MissReason>> {
        if let Some(caps) = self.breakpoint_hit.captures(line) {
            return Some(
                normalize_address(&caps[2])
                    .map(|address| Event::BreakpointHit {
                        id: caps[1].to_string(),
                        address,
                        context: caps[3].to_string(),
                    })
                    .ok_or(MissReason::MalformedBreakpointHit),
            );
        }
        if self.breakpoint_announcement.is_match(line) {
            return Some(Err(MissReason::MalformedBreakpointHit));
        }
        None
    }

    fn match_signal_report(&self, text: &str) -> Result<Event, MissReason> {
        let caps = self
            .signal_report
            .captures(text)
            .ok_or(MissReason::MalformedSignalReport)?;
        let signal: Signal = caps[1]
            .parse()
            .map_err(|_| MissReason::UnknownSignal(caps[1].to_string()))?;
        let address = normalize_address(&caps[2]).ok_or(MissReason::MalformedSignalReport)?;
        Ok(Event::SignalTrapped {
            signal,
            address,
            context: caps[3].to_string(),
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse base-16 digits (no prefix) and render them as lowercase `0x` hex
/// without leading zeros.
pub fn normalize_address(hex_digits: &str) -> Option<String> {
    u64::from_str_radix(hex_digits, 16)
        .ok()
        .map(|value| format!("{value:#x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(unit: &str) -> Classification {
        Classifier::new().classify(unit)
    }

    #[test]
    fn classify_breakpoint_hit() {
        let result = classify("Breakpoint 3, 0x08048456 in main\n(gdb) ");
        assert_eq!(
            result.events,
            vec![Event::BreakpointHit {
                id: "3".into(),
                address: "0x8048456".into(),
                context: "main".into(),
            }]
        );
        assert!(result.misses.is_empty());
    }

    #[test]
    fn classify_signal_report() {
        let result =
            classify("Program received signal SIGSEGV, Segmentation fault.\n0x0804846b in vuln ()\n");
        assert_eq!(
            result.events,
            vec![Event::SignalTrapped {
                signal: Signal::SIGSEGV,
                address: "0x804846b".into(),
                context: "vuln ()".into(),
            }]
        );
    }

    #[test]
    fn classify_breakpoint_ack_is_inert() {
        let result = classify("Breakpoint 1 at 0x4005d6: file demo.c, line 4.\n(gdb) ");
        assert!(result.events.is_empty());
        assert!(result.misses.is_empty());
    }

    #[test]
    fn classify_hit_with_source_location_is_a_miss() {
        let result = classify("Breakpoint 1, main () at demo.c:4\n4\t  return 0;\n(gdb) ");
        assert!(result.events.is_empty());
        assert_eq!(result.misses.len(), 1);
        assert_eq!(result.misses[0].reason, MissReason::MalformedBreakpointHit);
        assert_eq!(result.misses[0].line, "Breakpoint 1, main () at demo.c:4");
    }

    #[test]
    fn classify_unknown_signal_skips_only_that_event() {
        let unit = "Program received signal SIGFOO, Mystery.\n0x00401000 in f ()\n\
                    Breakpoint 2, 0x00401010 in g ()\n(gdb) ";
        let result = classify(unit);
        assert_eq!(result.events.len(), 1);
        assert!(matches!(result.events[0], Event::BreakpointHit { ref id, .. } if id == "2"));
        assert_eq!(
            result.misses[0].reason,
            MissReason::UnknownSignal("SIGFOO".into())
        );
    }

    #[test]
    fn classify_signal_without_stop_line_is_a_miss() {
        let result =
            classify("Program received signal SIGSEGV, Segmentation fault.\nvuln () at a.c:3\n");
        assert!(result.events.is_empty());
        assert_eq!(result.misses[0].reason, MissReason::MalformedSignalReport);
    }

    #[test]
    fn classify_multiple_events_in_line_order() {
        let unit = "Breakpoint 1, 0x0000000000401126 in main ()\n\
                    Continuing.\n\
                    Program received signal SIGABRT, Aborted.\n\
                    0x00007ffff7a42e97 in raise ()\n\
                    Breakpoint 4, 0x0000000000401200 in cleanup ()\n(gdb) ";
        let events = classify(unit).events;
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Event::BreakpointHit { ref id, .. } if id == "1"));
        assert!(matches!(
            events[1],
            Event::SignalTrapped { signal: Signal::SIGABRT, ref address, .. } if address == "0x7ffff7a42e97"
        ));
        assert!(matches!(events[2], Event::BreakpointHit { ref id, .. } if id == "4"));
    }

    #[test]
    fn classify_each_signal_report_uses_its_own_stop_line() {
        let unit = "Program received signal SIGTRAP, Trace/breakpoint trap.\n\
                    0x00401000 in first ()\n\
                    Program received signal SIGSEGV, Segmentation fault.\n\
                    0x00402000 in second ()\n";
        let events = classify(unit).events;
        assert_eq!(
            events,
            vec![
                Event::SignalTrapped {
                    signal: Signal::SIGTRAP,
                    address: "0x401000".into(),
                    context: "first ()".into(),
                },
                Event::SignalTrapped {
                    signal: Signal::SIGSEGV,
                    address: "0x402000".into(),
                    context: "second ()".into(),
                },
            ]
        );
    }

    #[test]
    fn classify_handles_crlf_line_endings() {
        let result = classify("Breakpoint 7, 0x00000010 in start\r\n(gdb) ");
        assert_eq!(
            result.events,
            vec![Event::BreakpointHit {
                id: "7".into(),
                address: "0x10".into(),
                context: "start".into(),
            }]
        );
    }

    #[test]
    fn classify_plain_output_has_no_events() {
        let result = classify("$1 = 42\n(gdb) ");
        assert_eq!(result, Classification::default());
    }

    #[test]
    fn normalize_address_drops_leading_zeros() {
        assert_eq!(normalize_address("08048456").as_deref(), Some("0x8048456"));
        assert_eq!(normalize_address("0").as_deref(), Some("0x0"));
        assert_eq!(normalize_address("zz"), None);
    }
}
