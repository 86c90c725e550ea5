use std::path::PathBuf;

use autopatch_core::{CommitKey, Status};
use autopatch_flow::testing::{Answer, Harness};
use autopatch_flow::{Payload, Reply, State, Template, Transition};
use autopatch_store::exchange::{export_commits, import_commits};
use autopatch_store::Workspace;

fn harness_with_template() -> Harness {
    let mut h = Harness::new();
    h.options.templates = vec![Template {
        name: "net".into(),
        path: PathBuf::from("/tmp/net.tmpl"),
    }];
    h
}

/// Answers that take a fresh commit up to the tag prompt.
fn commit_answers(h: &Harness) {
    h.prompt.push(Answer::Scroll(Reply::Ok));
    h.prompt.push(Answer::Menu(Some("net".into())));
}

/// Simulate a new process: drop in-memory state and reload from disk.
fn reopen(h: &mut Harness) {
    let ws = Workspace::open(h.root()).unwrap();
    h.workspace = ws;
}

#[test]
fn commit_to_test_address_finishes_record() {
    let mut h = harness_with_template();
    h.vcs.set_next_commit("Fix bug");
    commit_answers(&h);
    h.prompt.push(Answer::Input(Some(String::new())));
    h.prompt.push(Answer::YesNo(false));
    h.prompt.push(Answer::Menu(Some("test".into())));
    h.prompt.push(Answer::Input(Some("a@b.com".into())));

    let outcome = h.run(State::ConfirmCommit, Payload::None).unwrap();
    assert_eq!(outcome.state, State::Finish);
    assert_eq!(outcome.status, Some(Status::Finish));
    assert_eq!(h.prompt.remaining(), 0);

    reopen(&mut h);
    let record = &h.workspace.registry().list()[0];
    assert_eq!(record.status, Status::Finish);
    assert!(record.patch.starts_with("0001-"));
    assert_eq!(h.workspace.test_email(), Some("a@b.com"));

    let text = std::fs::read_to_string(h.patch_dir().join(&record.patch)).unwrap();
    assert!(text.contains("Subject: [PATCH] Fix bug"));

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ["a@b.com"]);
    assert_eq!(sent[0].cc, ["a@b.com"]);
}

#[test]
fn paused_commit_resumes_after_restart() {
    let mut h = harness_with_template();
    h.vcs.set_next_commit("Fix bug");
    commit_answers(&h);
    h.prompt.push(Answer::Input(None));
    let outcome = h.run(State::ConfirmCommit, Payload::None).unwrap();
    assert_eq!(outcome.status, Some(Status::SetTag));

    reopen(&mut h);
    assert_eq!(h.workspace.registry().list()[0].status, Status::SetTag);

    h.prompt.push(Answer::Input(Some("net".into())));
    h.prompt.push(Answer::YesNo(false));
    h.prompt.push(Answer::Menu(Some("test".into())));
    h.prompt.push(Answer::Input(Some("a@b.com".into())));
    let outcome = h.machine().resume("Fix bug").unwrap();
    assert_eq!(outcome.status, Some(Status::Finish));

    // Formatting ran once, before the pause.
    let formats = h.vcs.calls().iter().filter(|c| *c == "format_last").count();
    assert_eq!(formats, 1);
    let record = &h.workspace.registry().list()[0];
    let text = std::fs::read_to_string(h.patch_dir().join(&record.patch)).unwrap();
    assert!(text.contains("Subject: [PATCH net] Fix bug"));
}

#[test]
fn lint_failure_is_fixed_by_recommit() {
    let mut h = harness_with_template();
    h.vcs.set_next_commit("Fix bug");
    h.vcs.fail_check("0001-fix-bug.patch");
    commit_answers(&h);
    h.prompt.push(Answer::Input(Some(String::new())));
    h.prompt.push(Answer::YesNo(false));
    h.prompt.push(Answer::Scroll(Reply::Ok));
    let outcome = h.run(State::ConfirmCommit, Payload::None).unwrap();
    assert_eq!(outcome.state, State::CheckPatch);
    assert_eq!(outcome.status, Some(Status::ReCommit));

    h.vcs.clear_failures();
    h.prompt.push(Answer::Input(Some(String::new())));
    h.prompt.push(Answer::YesNo(false));
    let outcome = h.machine().resume("Fix bug").unwrap();
    assert_eq!(outcome.state, State::SelectSend);
    assert_eq!(outcome.status, Some(Status::ReCommit));

    assert_eq!(h.vcs.amended_messages(), [None]);
    assert_eq!(h.workspace.registry().list().len(), 1);
    let record = &h.workspace.registry().list()[0];
    assert!(h.patch_dir().join(&record.patch).exists());
}

#[test]
fn ambiguous_continue_is_an_error() {
    let mut h = Harness::new();
    h.stored_commit("Fix bug", 0, 0);
    h.stored_commit("Fix bug", 0, 0);
    assert!(h.machine().resume("Fix bug").is_err());
}

#[test]
fn group_without_cover_routes_to_make_cover() {
    let mut h = Harness::new();
    h.stored_commit("net: one", 2, 1);
    h.stored_commit("net: two", 2, 2);
    let t = h.machine().step(State::SendGroup, Payload::Group(2)).unwrap();
    assert_eq!(t, Transition::with(State::MakeCover, Payload::Group(2)));
}

#[test]
fn series_is_sent_to_maintainers() {
    let mut h = Harness::new();
    let keys = [
        h.stored_commit("net: one", 2, 1),
        h.stored_commit("net: two", 2, 2),
    ];
    h.editor.set_content("net: two fixes\n\nBoth fix leaks.\n");
    h.vcs.set_maintainers(vec![
        autopatch_git::Maintainer {
            email: "maint@example.org".into(),
            name: "Maint".into(),
        },
        autopatch_git::Maintainer {
            email: "netdev@example.org".into(),
            name: "open list".into(),
        },
    ]);
    h.prompt.push(Answer::YesNo(true));
    h.prompt.push(Answer::Menu(Some("mainline".into())));
    h.prompt.push(Answer::Checklist(Some(vec!["maint@example.org".into()])));
    h.prompt.push(Answer::Checklist(Some(vec!["netdev@example.org".into()])));

    let outcome = h.run(State::SendGroup, Payload::Group(2)).unwrap();
    assert_eq!(outcome.state, State::Finish);

    let sent = h.mailer.sent();
    assert_eq!(sent[0].to, ["maint@example.org"]);
    assert_eq!(sent[0].cc, ["netdev@example.org"]);
    let names: Vec<String> = sent[0]
        .patches
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        ["0001-net-one_cover.patch", "0001-net-one.patch", "0001-net-two.patch"]
    );
    assert_eq!(h.editor.viewed().len(), 3);

    for key in &keys {
        let record = h.workspace.registry().find_by_key(key).unwrap();
        assert_eq!(record.status, Status::Finish);
    }
}

#[test]
fn no_content_restore_of_standalone_record() {
    let mut h = Harness::new();
    let key = h.stored_commit("Fix bug", 0, 0);
    h.options.no_content = true;
    h.vcs.clear_calls();

    let outcome = h.machine_for(&key).run(State::Restore, Payload::None).unwrap();
    assert_eq!(outcome.status, Some(Status::ReCommit));
    assert!(h.vcs.applied().is_empty());
    assert_eq!(h.vcs.calls(), ["commit_empty"]);
    assert!(h.vcs.empty_commits()[0].starts_with("Fix bug\n\nBody of Fix bug."));
}

#[test]
fn clone_has_independent_artifact() {
    let mut h = Harness::new();
    let key = h.stored_commit("Fix bug", 0, 0);
    h.workspace.registry_mut().find_by_key_mut(&key).unwrap().version = 4;

    let mut m = h.machine();
    m.run(State::Clone, Payload::Key(key.clone())).unwrap();
    let clone_key = m.active_key().unwrap().clone();

    let reg = h.workspace.registry();
    let source = reg.find_by_key(&key).unwrap();
    let clone = reg.find_by_key(&clone_key).unwrap();
    assert_eq!(clone.version, 1);
    assert_ne!(clone.patch, source.patch);

    let source_path = h.patch_dir().join(&source.patch);
    let clone_path = h.patch_dir().join(&clone.patch);
    let original = std::fs::read_to_string(&source_path).unwrap();
    assert_eq!(std::fs::read_to_string(&clone_path).unwrap(), original);

    std::fs::write(&clone_path, "edited").unwrap();
    assert_eq!(std::fs::read_to_string(&source_path).unwrap(), original);
}

#[test]
fn new_version_is_decorated_on_next_send() {
    let mut h = Harness::new();
    let key = h.stored_commit("Fix bug", 0, 0);
    h.run(State::NewVersion, Payload::Key(key.clone())).unwrap();

    h.prompt.push(Answer::Input(Some(String::new())));
    h.prompt.push(Answer::YesNo(false));
    let outcome = h.machine().resume_key(&key).unwrap();
    assert_eq!(outcome.state, State::SelectSend);

    let amended = h.vcs.amended_messages();
    assert!(amended[0].as_deref().unwrap().starts_with("This is v2 of:\n"));
    let record = h.workspace.registry().find_by_key(&key).unwrap();
    let text = std::fs::read_to_string(h.patch_dir().join(&record.patch)).unwrap();
    assert!(text.contains("Subject: [PATCH v2] Fix bug"));
}

#[test]
fn export_and_import_between_workspaces() {
    let mut from = Harness::new();
    let a = from.stored_commit("net: one", 1, 1);
    from.stored_commit("net: two", 1, 2);
    from.stored_commit("other", 0, 0);

    let file = tempfile::NamedTempFile::new().unwrap();
    let group = from.workspace.registry().find_group(1);
    assert_eq!(
        export_commits(from.workspace.registry(), &group, file.path()).unwrap(),
        2
    );
    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
    assert_eq!(exported.as_array().unwrap().len(), 2);

    let mut to = Harness::new();
    let count = import_commits(to.workspace.registry_mut(), file.path()).unwrap();
    assert_eq!(count, 2);
    to.workspace.flush().unwrap();
    assert_eq!(
        import_commits(to.workspace.registry_mut(), file.path()).unwrap(),
        0
    );

    let record = to.workspace.registry().find_by_key(&a).unwrap();
    assert!(to.patch_dir().join(&record.patch).exists());
    assert_eq!(to.workspace.registry().find_group(1).len(), 2);
}

#[test]
fn unknown_key_for_new_version_stops_quietly() {
    let mut h = Harness::new();
    let outcome = h
        .run(State::NewVersion, Payload::Key(CommitKey::parse("missing").unwrap()))
        .unwrap();
    assert_eq!(outcome.status, None);
    assert!(h.prompt.notices()[0].contains("missing"));
}
