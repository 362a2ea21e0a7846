//! End-to-end coverage across envelope sealing, storage, and reconciliation —
//! the three modules as an application would actually compose them.

use depot_core::{reconcile, Edge, Envelope, Keypair, Store};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn open_store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("depot.redb")).unwrap();
    store.create_bucket("mail").unwrap();
    (dir, store)
}

#[test]
fn seal_store_reconcile_and_open_round_trip() {
    init_tracing();

    let world = Keypair::deterministic("acme-world");
    let alice = Keypair::generate();
    let bob = Keypair::generate();

    let (_d1, local) = open_store();
    let (_d2, remote) = open_store();

    // Alice drops ten envelopes addressed to Bob into her local store.
    for i in 0..10 {
        let env = Envelope::seal(
            &world,
            &alice,
            &[bob.clone()],
            format!("message {i}").as_bytes(),
        )
        .unwrap();
        let key = env.hash().unwrap();
        local
            .put("mail", key.as_bytes(), env.to_json_string().unwrap().as_bytes())
            .unwrap();
    }

    // Remote has none of them yet.
    let missing = reconcile("mail", &Edge::First, &Edge::Last, &local, &remote).unwrap();
    assert_eq!(missing.len(), 1);

    // Pull the divergent range's keys across and replay them into remote.
    for range in &missing {
        for key in local.scan_keys("mail", &range.first, &range.last).unwrap() {
            let value = local.get("mail", &key).unwrap();
            remote.put("mail", &key, &value).unwrap();
        }
    }

    // Now converged.
    let converged = reconcile("mail", &Edge::First, &Edge::Last, &local, &remote).unwrap();
    assert!(converged.is_empty());

    // Bob can open every envelope remote now holds; nobody else can.
    let eve = Keypair::generate();
    for key in remote.scan_keys("mail", &Edge::First, &Edge::Last).unwrap() {
        let raw = remote.get("mail", &key).unwrap();
        let env = Envelope::from_json_str(&String::from_utf8(raw).unwrap()).unwrap();

        assert!(env.is_same_world(&world));
        let opened = env.open(&world, &[bob.clone()]).unwrap();
        assert_eq!(opened.sender, alice.public_text());
        assert!(opened.plaintext.starts_with(b"message "));

        assert!(env.open(&world, &[eve.clone()]).is_err());
    }
}
