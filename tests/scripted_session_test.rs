//! End-to-end session flows against a scripted console.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc;

use gdbrelay_session::{
    ConsoleInput, PassThroughExit, ScriptedTransport, Session, SessionError, SessionOptions,
    Signal,
};

fn scripted() -> (Session, ScriptedTransport) {
    let transport = ScriptedTransport::new();
    let session = Session::new(transport.clone(), SessionOptions::default())
        .unwrap()
        .with_echo(std::io::sink());
    (session, transport)
}

#[test]
fn breakpoint_then_signal_then_inspection() {
    let (mut session, transport) = scripted();
    transport.push_output("(gdb) ");
    transport.queue_reply("Reading symbols from ./vuln...\n(gdb) ");
    transport.queue_reply("Breakpoint 1 at 0x8048456\n(gdb) ");
    transport.queue_reply(
        "Starting program: ./vuln AAAA\n\nBreakpoint 1, 0x08048456 in main ()\n(gdb) ",
    );
    transport.queue_reply("0xbffff6bc:\t0x41414141\n(gdb) ");
    transport.queue_reply(
        "\nProgram received signal SIGSEGV, Segmentation fault.\n0x41414141 in ?? ()\n(gdb) ",
    );
    transport.queue_reply("eip            0x41414141          0x41414141\n(gdb) ");

    session.read_response().unwrap();
    session.file(Path::new("./vuln")).unwrap();

    let words = Rc::new(RefCell::new(Vec::new()));
    let seen = words.clone();
    session
        .set_breakpoint_with(
            "*0x8048456",
            move |session: &mut Session, _: &str, _: &str, _: &str| {
                let word = session.get_stack(12).unwrap().unwrap();
                seen.borrow_mut().push(word.value());
            },
        )
        .unwrap();

    let crashes = Rc::new(RefCell::new(Vec::new()));
    let crash_log = crashes.clone();
    session.set_signal_handler(
        Signal::SIGSEGV,
        move |session: &mut Session, _: Signal, address: &str, _: &str| {
            let eip = session.get_registers().unwrap().get("eip").map(|r| r.value().to_string());
            crash_log.borrow_mut().push((address.to_string(), eip));
        },
    );

    session.run(&["AAAA"]).unwrap();
    session.continue_execution().unwrap();

    assert_eq!(*words.borrow(), vec!["0x41414141".to_string()]);
    assert_eq!(
        *crashes.borrow(),
        vec![("0x41414141".to_string(), Some("0x41414141".to_string()))]
    );
    assert_eq!(
        transport.commands(),
        vec![
            "file ./vuln",
            "b *0x8048456",
            "run AAAA",
            "x/x $ebp-12",
            "c",
            "info registers",
        ]
    );
}

#[test]
fn pass_through_hands_back_to_script() {
    let (mut session, transport) = scripted();
    transport.queue_reply("Breakpoint 1 at 0x401000\n(gdb) ");
    transport.queue_reply("$1 = 7\n(gdb) ");
    transport.queue_reply("(gdb) ");

    let (tx, rx) = mpsc::channel();
    tx.send(ConsoleInput::Line("b *0x401000".into())).unwrap();
    tx.send(ConsoleInput::Line("p 7".into())).unwrap();
    tx.send(ConsoleInput::Interrupt).unwrap();

    assert_eq!(session.interact(&rx).unwrap(), PassThroughExit::Interrupted);
    assert!(!session.is_interactive());

    // Breakpoints typed by hand are not registered.
    assert!(session.get_breakpoint("1").is_none());

    session.close().unwrap();
    assert_eq!(
        transport.commands(),
        vec!["b *0x401000", "p 7", "set confirm off", "quit"]
    );
}

#[test]
fn unresolved_breakpoint_leaves_session_usable() {
    let (mut session, transport) = scripted();
    transport.queue_reply("Function \"nope\" not defined.\n(gdb) ");
    transport.queue_reply("$1 = 1\n(gdb) ");

    assert!(session.pending_breakpoints());
    let err = session.set_breakpoint("nope").unwrap_err();
    assert!(matches!(err, SessionError::UnresolvedLocation(_)));
    assert_eq!(session.print("1").unwrap(), "$1 = 1\n(gdb) ");
}
