//! End-to-end behaviour of a session, one line at a time.

use rstest::rstest;
use termsim_kernel::{Session, SessionConfig};

fn user_session() -> Session {
    Session::new(SessionConfig::default()).expect("session should start")
}

fn root_session() -> Session {
    Session::new(SessionConfig::root()).expect("session should start")
}

// ============================================================================
// Pipes and chains
// ============================================================================

#[tokio::test]
async fn pipe_feeds_stdout_to_stdin() {
    let mut s = user_session();
    s.execute("echo -e 'pear\\napple\\nfig' > /tmp/fruit").await;
    assert_eq!(s.execute("cat /tmp/fruit | sort | head -n 1").await, "apple\n");
}

#[rstest]
#[case("true && echo yes", "yes\n")]
#[case("false && echo yes", "")]
#[case("false || echo fallback", "fallback\n")]
#[case("true || echo fallback", "")]
#[case("false; echo always", "always\n")]
#[case("false && echo skipped || echo rescued", "rescued\n")]
#[tokio::test]
async fn chain_operators(#[case] line: &str, #[case] expected: &str) {
    let mut s = user_session();
    assert_eq!(s.execute(line).await, expected);
}

#[tokio::test]
async fn operators_inside_quotes_are_text() {
    let mut s = user_session();
    assert_eq!(s.execute("echo 'a && b | c; d'").await, "a && b | c; d\n");
}

#[tokio::test]
async fn trailing_comments_are_ignored() {
    let mut s = user_session();
    assert_eq!(s.execute("echo a # comment with 'quote").await, "a\n");
    assert_eq!(s.execute("echo '#' a#b # gone").await, "# a#b\n");
    s.execute("X='#'").await;
    assert_eq!(s.execute("echo $X kept").await, "# kept\n");
}

// ============================================================================
// Filesystem scenarios
// ============================================================================

#[tokio::test]
async fn mkdir_ls_rm_from_root_home() {
    let mut s = root_session();
    assert_eq!(s.cwd(), "/root");
    s.execute("mkdir -p a/b/c").await;
    assert_eq!(s.execute("ls a/b").await, "c\n");

    s.execute("rm -r a").await;
    let result = s.run_line("ls a").await;
    assert_ne!(result.code, 0);
    assert_eq!(result.err, "ls: cannot access 'a': No such file or directory\n");
}

#[tokio::test]
async fn redirect_then_append() {
    let mut s = user_session();
    assert_eq!(s.execute("echo hello > /tmp/x").await, "");
    assert_eq!(s.execute("cat /tmp/x").await, "hello\n");
    s.execute("echo world >> /tmp/x").await;
    assert_eq!(s.execute("cat /tmp/x").await, "hello\nworld\n");
}

#[tokio::test]
async fn removing_non_empty_directory_needs_recursion() {
    let mut s = user_session();
    s.execute("mkdir -p box/inner && touch box/inner/file").await;

    let result = s.run_line("rmdir box").await;
    assert_eq!(result.code, 1);
    assert!(result.err.contains("Directory not empty"));
    assert!(s.vfs().exists("/home/user/box/inner/file"));

    assert!(s.run_line("rm -r box").await.ok());
    assert!(!s.vfs().exists("/home/user/box"));
}

#[tokio::test]
async fn copying_dev_null_truncates() {
    let mut s = user_session();
    s.execute("echo keep > /tmp/f").await;
    let result = s.run_line("cp /dev/null /tmp/f").await;
    assert_eq!((result.code, result.err.as_str()), (0, ""));
    assert_eq!(s.execute("cat /tmp/f").await, "");
    assert_eq!(s.run_line("cp /tmp/f /dev/full").await.code, 1);
}

#[tokio::test]
async fn failed_move_keeps_the_source() {
    let mut s = user_session();
    s.execute("echo keep > precious").await;
    let result = s.run_line("mv precious /nowhere/else").await;
    assert_eq!(result.code, 1);
    assert_eq!(s.execute("cat precious").await, "keep\n");
}

#[tokio::test]
async fn unmatched_glob_stays_literal() {
    let mut s = user_session();
    assert_eq!(s.execute("echo /tmp/*.nothing").await, "/tmp/*.nothing\n");
}

#[tokio::test]
async fn globs_expand_in_listing_order() {
    let mut s = user_session();
    s.execute("mkdir g && cd g && touch b.txt a.txt c.log").await;
    assert_eq!(s.execute("echo *.txt").await, "a.txt b.txt\n");
    assert_eq!(s.execute("echo '*.txt'").await, "*.txt\n");
}

#[tokio::test]
async fn cd_and_pwd() {
    let mut s = user_session();
    assert_eq!(s.execute("cd /usr/bin && pwd").await, "/usr/bin\n");
    assert_eq!(s.execute("cd - > /dev/null; pwd").await, "/home/user\n");
    let result = s.run_line("cd /etc/passwd").await;
    assert_eq!(result.err, "-bash: cd: /etc/passwd: Not a directory\n");
    assert_eq!(s.cwd(), "/home/user");
}

// ============================================================================
// Variables
// ============================================================================

#[tokio::test]
async fn export_and_unset() {
    let mut s = user_session();
    s.execute("export FOO=bar").await;
    assert_eq!(s.execute("echo $FOO").await, "bar\n");
    s.execute("unset FOO").await;
    assert_eq!(s.execute("echo $FOO").await, "\n");
}

#[tokio::test]
async fn unset_variables_expand_to_nothing() {
    let mut s = user_session();
    let result = s.run_line("echo \"[$NOT_SET_ANYWHERE]\"").await;
    assert!(result.ok());
    assert_eq!(result.out, "[]\n");
}

#[tokio::test]
async fn special_parameters() {
    let mut s = user_session();
    assert_eq!(s.execute("echo $0").await, "-bash\n");
    assert_eq!(s.execute("echo ~").await, "/home/user\n");
    assert_eq!(s.execute("echo ${UNSET:-fallback}").await, "fallback\n");

    let random = s.execute("echo $RANDOM").await;
    let value: u32 = random.trim().parse().expect("RANDOM is a number");
    assert!(value < 32768);

    let pid = s.execute("echo $$").await;
    assert!(pid.trim().parse::<u32>().is_ok());
}

#[tokio::test]
async fn variable_values_cannot_inject_operators() {
    let mut s = user_session();
    s.execute("X='a; echo injected'").await;
    assert_eq!(s.execute("echo $X").await, "a; echo injected\n");
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn unknown_command_is_127() {
    let mut s = user_session();
    let result = s.run_line("frobnicate --now").await;
    assert_eq!(result.code, 127);
    assert_eq!(result.err, "-bash: frobnicate: command not found\n");
    assert_eq!(s.execute("echo $?").await, "127\n");
}

#[tokio::test]
async fn absolute_paths_reach_builtins() {
    let mut s = user_session();
    assert_eq!(s.execute("echo via path | /bin/cat").await, "via path\n");
    assert_eq!(s.run_line("/bin/nothing").await.code, 127);
}

#[tokio::test]
async fn stderr_of_piped_stages_is_shown() {
    let mut s = user_session();
    let text = s.execute("cat missing | wc -l").await;
    assert_eq!(text, "0\ncat: missing: No such file or directory\n");
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn bang_bang_repeats_the_last_line() {
    let mut s = user_session();
    s.execute("echo again").await;
    assert_eq!(s.execute("!!").await, "echo again\nagain\n");
    assert_eq!(s.execute("!1").await, "echo again\nagain\n");
}

#[tokio::test]
async fn history_lists_numbered_entries() {
    let mut s = user_session();
    s.execute("echo one").await;
    s.execute("pwd").await;
    assert_eq!(
        s.execute("history").await,
        "    1  echo one\n    2  pwd\n    3  history\n"
    );
}

// ============================================================================
// Filesystem snapshots
// ============================================================================

#[tokio::test]
async fn snapshot_round_trip_through_json() {
    let mut s = user_session();
    s.execute("mkdir -p project/src && echo 'fn main() {}' > project/src/main.rs").await;
    s.execute("ln -s project/src/main.rs entry").await;
    let json = s.snapshot_filesystem().to_json().expect("serializes");

    let mut other = user_session();
    let snapshot = termsim_kernel::Snapshot::from_json(&json).expect("parses");
    other.restore_filesystem(&snapshot).expect("imports");
    assert_eq!(other.snapshot_filesystem(), snapshot);
    assert_eq!(other.execute("cat entry").await, "fn main() {}\n");
}

#[tokio::test]
async fn sessions_are_independent() {
    let mut a = user_session();
    let mut b = user_session();
    a.execute("touch only-in-a; export ONLY_A=1").await;
    assert!(!b.vfs().exists("/home/user/only-in-a"));
    assert_eq!(b.execute("echo $ONLY_A").await, "\n");
}
