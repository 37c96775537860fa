mod common;

use common::*;

use probestub::stub::ProbeStub;
use probestub::target::TargetError;

fn detach_message() -> String {
    format!("$O{}", hex(b"You are now detached from the previous target.\n"))
}

#[test]
fn fatal_poll_destroys_every_target() {
    let (mut registry, state) = mock_registry();
    registry.add(mock_descriptor(&state));
    state
        .borrow_mut()
        .polls
        .push_back(Err(TargetError::Fatal("SWD line reset failed")));

    let out = run(
        &mut registry,
        &script(&[b"vAttach;1", b"c", b"?", b"vStopped", b"vStopped"]),
    );

    assert_eq!(
        split_output(&out),
        [
            "+".to_string(),
            "$T05thread:1;".to_string(),
            "+".to_string(),
            "$EFF".to_string(),
            // the next packet is preceded by the detach notification
            "+".to_string(),
            "%Stop:W00".to_string(),
            detach_message(),
            "$W00".to_string(),
            "+".to_string(),
            "$W00".to_string(),
            "+".to_string(),
            "$OK".to_string(),
        ]
    );
    assert!(registry.is_empty());
}

#[test]
fn session_continues_after_a_fault() {
    let (mut registry, state) = mock_registry();
    state
        .borrow_mut()
        .polls
        .push_back(Err(TargetError::Fatal("core locked up")));

    let out = run(
        &mut registry,
        &script(&[b"vAttach;1", b"c", b"vAttach;1", b"qC"]),
    );

    // the registry stays empty until the probe rescans
    assert_eq!(
        replies(&out),
        [
            "T05thread:1;".to_string(),
            "EFF".to_string(),
            detach_message()[1..].to_string(),
            "E01".to_string(),
            "QC1".to_string(),
        ]
    );
}

#[test]
fn destroying_the_current_target_from_a_monitor_command() {
    let (mut registry, _state) = mock_registry();

    let conn = ScriptConn::new(&script(&[
        b"vAttach;1",
        format!("qRcmd,{}", hex(b"forget")).as_bytes(),
        b"vStopped",
        b"vStopped",
        b"g",
    ]));
    let mut stub = ProbeStub::builder(conn)
        .monitor_handler(|registry, session, cmd, _out| match cmd {
            b"forget" => {
                let id = session.current()?;
                registry.remove(id, session);
                Some(true)
            }
            _ => None,
        })
        .build()
        .unwrap();
    let out = run_stub(&mut stub, &mut registry);

    assert_eq!(
        split_output(&out),
        [
            "+".to_string(),
            "$T05thread:1;".to_string(),
            "+".to_string(),
            "%Stop:W00".to_string(),
            detach_message(),
            "$OK".to_string(),
            "+".to_string(),
            "$W00".to_string(),
            "+".to_string(),
            "$OK".to_string(),
            "+".to_string(),
            "$EFF".to_string(),
        ]
    );
    assert!(registry.is_empty());
    assert_eq!(stub.session().current(), None);
}

#[test]
fn detach_failure_is_not_fatal() {
    let (mut registry, state) = mock_registry();
    state.borrow_mut().detach_ok = false;

    let out = run(&mut registry, &script(&[b"vAttach;1", b"D", b"qC"]));

    assert_eq!(replies(&out), ["T05thread:1;", "OK", "QC1"]);
    assert_eq!(state.borrow().detaches, 1);
    assert_eq!(registry.len(), 1);
}
