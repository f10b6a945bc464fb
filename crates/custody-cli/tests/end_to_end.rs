//! End-to-end tests: the `custody` subcommand handlers against a real
//! custody-api server bound to a loopback port.

use std::path::PathBuf;

use custody_api::{AppConfig, AppState};
use custody_cli::evidence::{run_count, run_get, run_submit, run_upload};
use custody_cli::evidence::{CountArgs, GetArgs, SubmitArgs, UploadArgs};
use custody_cli::verify::{run_verify, VerifyArgs};
use custody_client::{ClientConfig, CustodyClient};
use custody_core::Address;
use tempfile::TempDir;

const ALICE: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

struct Harness {
    _server_dir: TempDir,
    files: TempDir,
    client: CustodyClient,
}

impl Harness {
    async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = format!("http://{addr}");

        let server_dir = tempfile::tempdir().unwrap();
        let state = AppState::build(AppConfig {
            bind: addr,
            storage_dir: server_dir.path().join("uploads"),
            public_url: url.clone(),
            ..AppConfig::default()
        })
        .unwrap();
        state.start().await.unwrap();
        let app = custody_api::app(state);
        tokio::spawn(async move { axum::serve(listener, app).await });

        let mut config = ClientConfig::for_url(&url).unwrap();
        config.poll_interval_ms = 50;
        Self {
            _server_dir: server_dir,
            files: tempfile::tempdir().unwrap(),
            client: CustodyClient::new(config).unwrap(),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.files.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

fn verify_file(path: PathBuf, server: bool) -> VerifyArgs {
    VerifyArgs {
        file: Some(path),
        hash: None,
        commitment: None,
        server,
        start_block: 0,
    }
}

#[tokio::test]
async fn upload_submit_and_verify_round_trip() {
    let h = Harness::start().await;
    let exhibit = h.write("exhibit.txt", b"hello");

    let upload = UploadArgs {
        file: exhibit.clone(),
    };
    assert_eq!(run_upload(&h.client, &upload).await.unwrap(), 0);

    let submit = SubmitArgs {
        submitter: ALICE.to_string(),
        hash: None,
        file: Some(exhibit.clone()),
        upload: true,
        metadata: "exhibit A, bag 12".to_string(),
        file_url: None,
        note: None,
        proof: None,
    };
    assert_eq!(run_submit(&h.client, &submit).await.unwrap(), 0);

    let alice = Address::parse(ALICE).unwrap();
    assert_eq!(h.client.count(&alice).await.unwrap(), 1);
    let event = h.client.get(&alice, 0).await.unwrap().unwrap();
    assert!(event.file_url.unwrap().ends_with(".txt"));

    let count = CountArgs {
        submitter: ALICE.to_string(),
    };
    assert_eq!(run_count(&h.client, &count).await.unwrap(), 0);
    let missing = GetArgs {
        submitter: ALICE.to_string(),
        index: 5,
    };
    assert_eq!(run_get(&h.client, &missing).await.unwrap(), 1);

    let local = verify_file(exhibit.clone(), false);
    assert_eq!(run_verify(&h.client, &local).await.unwrap(), 0);
    let remote = verify_file(exhibit, true);
    assert_eq!(run_verify(&h.client, &remote).await.unwrap(), 0);

    let other = verify_file(h.write("other.txt", b"goodbye"), false);
    assert_eq!(run_verify(&h.client, &other).await.unwrap(), 1);
}

#[tokio::test]
async fn rejected_proof_fails_submit_and_appends_nothing() {
    let h = Harness::start().await;
    let bundle = h.write(
        "bundle.json",
        br#"{
            "proof": {
                "pi_a": ["1", "1", "1"],
                "pi_b": [["0", "0"], ["0", "0"], ["1", "0"]],
                "pi_c": ["0", "0", "1"],
                "protocol": "groth16",
                "curve": "bn128"
            },
            "publicSignals": ["7"]
        }"#,
    );

    let submit = SubmitArgs {
        submitter: ALICE.to_string(),
        hash: Some("0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8".into()),
        file: None,
        upload: false,
        metadata: "proof gated".to_string(),
        file_url: None,
        note: None,
        proof: Some(bundle),
    };
    assert!(run_submit(&h.client, &submit).await.is_err());

    let alice = Address::parse(ALICE).unwrap();
    assert_eq!(h.client.count(&alice).await.unwrap(), 0);
}
