mod common;

use common::*;

use probestub::outputln;
use probestub::stub::ProbeStub;

fn rcmd(cmd: &str) -> Vec<u8> {
    format!("qRcmd,{}", hex(cmd.as_bytes())).into_bytes()
}

#[test]
fn target_command() {
    let (mut registry, state) = mock_registry();

    let out = run(&mut registry, &script(&[b"vAttach;1", &rcmd("hello")]));

    assert_eq!(
        replies(&out),
        [
            "T05thread:1;".to_string(),
            format!("O{}", hex(b"hello from the target\n")),
            "OK".to_string(),
        ]
    );
    assert_eq!(state.borrow().monitor_cmds, [b"hello".to_vec()]);
}

#[test]
fn failed_target_command() {
    let (mut registry, _state) = mock_registry();

    let out = run(&mut registry, &script(&[b"vAttach;1", &rcmd("bogus")]));

    assert_eq!(replies(&out), ["T05thread:1;".to_string(), hex(b"Failed\n")]);
}

#[test]
fn no_target_no_handler() {
    let (mut registry, state) = mock_registry();

    let out = run(&mut registry, &script(&[&rcmd("hello")]));

    assert_eq!(replies(&out), [""]);
    assert!(state.borrow().monitor_cmds.is_empty());
}

#[test]
fn stub_handler_takes_precedence() {
    let (mut registry, state) = mock_registry();

    let conn = ScriptConn::new(&script(&[
        &rcmd("version"),
        b"vAttach;1",
        &rcmd("version"),
        &rcmd("hello"),
    ]));
    let mut stub = ProbeStub::builder(conn)
        .monitor_handler(|registry, _session, cmd, mut out| match cmd {
            b"version" => {
                outputln!(out, "probestub, {} target(s)", registry.len());
                Some(true)
            }
            _ => None,
        })
        .build()
        .unwrap();
    let out = run_stub(&mut stub, &mut registry);

    let version = format!("O{}", hex(b"probestub, 1 target(s)\n"));
    assert_eq!(
        replies(&out),
        [
            version.clone(),
            "OK".to_string(),
            "T05thread:1;".to_string(),
            version,
            "OK".to_string(),
            format!("O{}", hex(b"hello from the target\n")),
            "OK".to_string(),
        ]
    );
    // only unrecognized commands reach the target
    assert_eq!(state.borrow().monitor_cmds, [b"hello".to_vec()]);
}

#[test]
fn fatal_target_command_destroys_targets() {
    let (mut registry, _state) = mock_registry();

    let out = run(&mut registry, &script(&[b"vAttach;1", &rcmd("lockup")]));

    assert_eq!(replies(&out), ["T05thread:1;", "EFF"]);
    assert!(registry.is_empty());
}
