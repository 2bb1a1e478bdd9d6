mod common;

use common::{bridge_at, bridge_with_dialogs, RecordingLauncher};
use serde_json::{json, Value};

async fn call(bridge: &common::TestBridge, request: Value) -> Value {
    bridge.invoke(&request.to_string()).await
}

#[tokio::test]
async fn unknown_and_malformed_requests_are_validation_failures() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge_at(dir.path(), RecordingLauncher::default());

    for request in [
        json!({ "op": "deleteEverything" }).to_string(),
        json!({ "op": "runGame", "payload": { "gameId": "g1", "args": "--fullscreen" } })
            .to_string(),
        json!({ "op": "saveUpload", "payload": { "slot": "s1", "bytes": [1], "path": "/etc" } })
            .to_string(),
        "not json".to_string(),
    ] {
        let reply = bridge.invoke(&request).await;
        assert_eq!(reply["ok"], json!(false), "{request}");
        assert_eq!(reply["reason"], json!("validation-failure"), "{request}");
    }
}

#[tokio::test]
async fn run_game_without_executable() {
    let dir = tempfile::tempdir().unwrap();
    let launcher = RecordingLauncher::default();
    let bridge = bridge_at(dir.path(), launcher.clone());

    let reply = call(
        &bridge,
        json!({ "op": "runGame", "payload": { "gameId": "g1", "args": [] } }),
    )
    .await;

    assert_eq!(reply["ok"], json!(false));
    assert_eq!(reply["reason"], json!("not-configured"));
    assert_eq!(launcher.spawn_count(), 0);
}

#[tokio::test]
async fn save_slot_round_trip_over_json() {
    let dir = tempfile::tempdir().unwrap();
    let (bridge, dialogs) = bridge_with_dialogs(dir.path(), RecordingLauncher::default());
    let dest = dir.path().join("export.zip");
    dialogs.set_save_destination(Some(dest.clone()));

    let stored = call(
        &bridge,
        json!({ "op": "saveUpload", "payload": { "slot": "slot1", "bytes": [1, 2, 3] } }),
    )
    .await;
    assert_eq!(stored["ok"], json!(true));
    assert_eq!(stored["name"], json!("slot1.zip"));

    let exported = call(
        &bridge,
        json!({ "op": "saveDownload", "payload": { "slot": "slot1" } }),
    )
    .await;
    assert_eq!(
        exported,
        json!({ "ok": true, "filePath": dest.to_string_lossy() })
    );
    assert_eq!(std::fs::read(&dest).unwrap(), vec![1, 2, 3]);

    let empty = call(
        &bridge,
        json!({ "op": "saveDownload", "payload": { "slot": "slot9" } }),
    )
    .await;
    assert_eq!(empty, json!({ "ok": false, "reason": "empty" }));
}

#[tokio::test]
async fn save_import_over_json_reads_the_chosen_file() {
    let dir = tempfile::tempdir().unwrap();
    let (bridge, dialogs) = bridge_with_dialogs(dir.path(), RecordingLauncher::default());
    let source = dir.path().join("Chapter 3.zip");
    std::fs::write(&source, [4, 5]).unwrap();
    dialogs.set_save_source(Some(source));

    let stored = call(
        &bridge,
        json!({ "op": "saveImport", "payload": { "slot": "slot2" } }),
    )
    .await;
    assert_eq!(stored["ok"], json!(true));
    assert_eq!(stored["name"], json!("Chapter 3.zip"));
    assert_eq!(
        std::fs::read(dir.path().join("saves").join("slot2.zip")).unwrap(),
        vec![4, 5]
    );
}

#[tokio::test]
async fn simple_queries() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge_at(dir.path(), RecordingLauncher::default());

    assert_eq!(call(&bridge, json!({ "op": "getExecutable" })).await, Value::Null);
    assert_eq!(
        call(&bridge, json!({ "op": "getAppVersion" })).await,
        json!("1.0.0-test")
    );
    assert!(call(&bridge, json!({ "op": "getPlatform" })).await.is_string());
    assert_eq!(
        call(
            &bridge,
            json!({ "op": "openExternal", "payload": "javascript:alert(1)" })
        )
        .await,
        json!(false)
    );
}

#[tokio::test]
async fn update_operations_in_dev_build() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = bridge_at(dir.path(), RecordingLauncher::default());

    let check = call(&bridge, json!({ "op": "updateCheck" })).await;
    assert_eq!(check["ok"], json!(false));
    assert_eq!(check["dev"], json!(true));
    assert!(check["message"].is_string());

    let install = call(&bridge, json!({ "op": "updateQuitAndInstall" })).await;
    assert_eq!(install, json!({ "ok": false, "dev": true }));
}
