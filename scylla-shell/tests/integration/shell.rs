use std::io::Cursor;

use scylla_shell::render::NO_OUTPUT_MESSAGE;
use scylla_shell::shell::{PlainLines, FAREWELL};
use scylla_shell::{session, tls, ConnectionConfig, ExitReason, Shell};

use crate::utils::{cluster_address, setup_tracing};

// Needs a cluster with client encryption enabled at SCYLLA_URI.
#[tokio::test]
#[cfg_attr(not(cluster_tests), ignore)]
async fn statements_run_against_live_cluster() {
    setup_tracing();
    let (host, port) = cluster_address();
    let config = ConnectionConfig {
        host,
        port,
        ..Default::default()
    };
    let session = session::connect(&config, tls::assemble(&config).unwrap())
        .await
        .unwrap();

    let script = "\
CREATE KEYSPACE IF NOT EXISTS scylla_shell_it WITH REPLICATION = {'class' : 'NetworkTopologyStrategy', 'replication_factor' : 1}
USE scylla_shell_it
CREATE TABLE IF NOT EXISTS t (a int PRIMARY KEY, b text)
INSERT INTO t (a, b) VALUES (1, 'one')
SELEKT nonsense
SELECT a, b FROM t WHERE a = 1
exit
";
    let mut input = PlainLines::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
    let mut shell = Shell::new(session, Vec::new(), Vec::new());
    assert_eq!(
        shell.run(&mut input).await.unwrap(),
        ExitReason::ExitCommand
    );

    let (_session, out, err) = shell.into_parts();
    let out = String::from_utf8(out).unwrap();
    let err = String::from_utf8(err).unwrap();

    assert_eq!(out.matches(NO_OUTPUT_MESSAGE).count(), 4);
    assert!(out.contains(&format!("{:<20}{:<20}\n", "a", "b")));
    assert!(out.contains(&format!("{:<20}{:<20}\n", "1", "one")));
    assert!(out.ends_with(&format!("{FAREWELL}\n")));
    assert!(err.starts_with("Error executing query: "));
    assert_eq!(err.lines().count(), 1);
}
