//! Config file settings flowing into a running bridge.

use std::path::PathBuf;

use mjml_config::BridgeConfig;
use mjml_core::RenderBridge;
use serde_json::json;

use crate::common::EchoInvoker;

#[tokio::test]
async fn config_file_defaults_reach_the_renderer() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            "scratch_dir = {:?}\n\n[render]\nkeep_comments = false\nbeautify = true\n",
            scratch.display().to_string()
        ),
    )
    .unwrap();

    let config = BridgeConfig::load_from(&path).unwrap().unwrap();
    let invoker = EchoInvoker::new();
    let bridge = RenderBridge::start(invoker.clone(), config.bridge_options())
        .await
        .unwrap();

    assert_eq!(bridge.script_path().parent(), Some(scratch.as_path()));

    let response = bridge
        .render("<mjml><mj-body></mj-body></mjml>")
        .await
        .unwrap();
    assert!(!response.has_errors());

    let (script, args) = invoker.calls().pop().unwrap();
    assert_eq!(script, bridge.script_path());
    assert_eq!(
        args,
        vec![
            json!("<mjml><mj-body></mj-body></mjml>"),
            json!({ "keepComments": false, "beautify": true, "minify": false }),
        ]
    );

    bridge.shutdown().await;
    let leftovers: Vec<PathBuf> = std::fs::read_dir(&scratch)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert!(leftovers.is_empty(), "scratch dir not cleaned: {leftovers:?}");
}

#[tokio::test]
async fn missing_config_file_means_default_bridge() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = BridgeConfig::load_from(&dir.path().join("absent.toml")).unwrap();
    let config = loaded.unwrap_or_default();

    let invoker = EchoInvoker::new();
    let bridge = RenderBridge::start(invoker.clone(), config.bridge_options())
        .await
        .unwrap();
    assert!(bridge.defaults().keep_comments);
    assert!(bridge.defaults().beautify);
    assert!(!bridge.options().minify);
    bridge.shutdown().await;
}
