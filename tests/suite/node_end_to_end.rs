//! The real renderer script running under the real Node.js host.
//!
//! A stub `mjml` package on `NODE_PATH` stands in for the npm module, so
//! these tests need `node` but not a network install.

use std::path::Path;
use std::time::Duration;

use mjml_core::{BridgeError, BridgeOptions, InvokeError, RenderBridge, RenderDefaults};
use mjml_node::{NodeConfig, NodeInvoker};
use mjml_utils::MaterializeOptions;

use crate::common::node_available;

const STUB_MJML: &str = r"'use strict';
module.exports = function mjml2html(view, options) {
  if (typeof view === 'string' && view.includes('<explode/>')) {
    throw new Error('Malformed MJML');
  }
  const errors = [];
  if (typeof view === 'string' && view.includes('<mj-column>') && !view.includes('<mj-section>')) {
    errors.push({
      line: 1,
      message: 'mj-column cannot be used inside mj-body',
      tagName: 'mj-column',
      formattedMessage: 'Line 1 of inline (mj-column) mj-column cannot be used inside mj-body',
    });
  }
  const kind = typeof view === 'string' ? 'markup' : 'tree';
  return { html: `<html data-kind=${kind}>${JSON.stringify(options)}</html>`, errors };
};
";

/// Same shape as newer mjml releases, where `mjml2html` resolves asynchronously.
const ASYNC_STUB_MJML: &str = r"'use strict';
module.exports = async function mjml2html(view, options) {
  await new Promise((resolve) => setTimeout(resolve, 5));
  if (typeof view === 'string' && view.includes('<explode/>')) {
    throw new Error('Malformed MJML');
  }
  return { html: `<html data-async=1>${JSON.stringify(options)}</html>`, errors: [] };
};
";

fn install_stub_mjml(dir: &Path, source: &str) {
    let package = dir.join("node_modules").join("mjml");
    std::fs::create_dir_all(&package).unwrap();
    std::fs::write(package.join("index.js"), source).unwrap();
}

async fn start_bridge(dir: &Path, defaults: RenderDefaults) -> RenderBridge<NodeInvoker> {
    start_bridge_with(dir, defaults, STUB_MJML).await
}

async fn start_bridge_with(
    dir: &Path,
    defaults: RenderDefaults,
    stub: &str,
) -> RenderBridge<NodeInvoker> {
    install_stub_mjml(dir, stub);
    let config = NodeConfig::default()
        .with_node_path(vec![dir.join("node_modules")])
        .with_invocation_timeout(Duration::from_secs(30))
        .unwrap();
    let invoker =
        NodeInvoker::with_materialize_options(config, &MaterializeOptions::in_dir(dir)).unwrap();
    RenderBridge::start(
        invoker,
        BridgeOptions {
            defaults,
            scratch_dir: Some(dir.to_path_buf()),
            ..BridgeOptions::default()
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn markup_and_tree_render_through_node() {
    if !node_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let bridge = start_bridge(
        dir.path(),
        RenderDefaults {
            keep_comments: false,
            beautify: true,
        },
    )
    .await;

    let markup = bridge
        .render("<mjml><mj-body></mj-body></mjml>")
        .await
        .unwrap();
    assert!(markup.html.starts_with("<html data-kind=markup>"));
    assert!(markup.html.contains(r#""keepComments":false"#));
    assert!(markup.html.contains(r#""beautify":true"#));
    assert!(markup.html.contains(r#""minify":false"#));
    assert!(!markup.has_errors());

    let tree = bridge
        .render_json(r#"{"tagName":"mjml","attributes":{},"children":[]}"#)
        .await
        .unwrap();
    assert!(tree.html.starts_with("<html data-kind=tree>"));

    bridge.shutdown().await;
}

#[tokio::test]
async fn renderer_errors_and_failures_surface() {
    if !node_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let bridge = start_bridge(dir.path(), RenderDefaults::default()).await;

    let reported = bridge
        .render("<mjml><mj-body><mj-column></mj-column></mj-body></mjml>")
        .await
        .unwrap();
    assert_eq!(reported.errors.len(), 1);
    assert_eq!(reported.errors[0].line, Some(1));
    assert_eq!(reported.errors[0].tag_name.as_deref(), Some("mj-column"));

    let err = bridge.render("<mjml><explode/></mjml>").await.unwrap_err();
    match err {
        BridgeError::Invocation(InvokeError::Script { message, .. }) => {
            assert_eq!(message, "Malformed MJML");
        }
        other => panic!("expected script failure, got {other:?}"),
    }

    // a thrown template error does not take the host down
    bridge.render("<mjml></mjml>").await.unwrap();
    bridge.shutdown().await;
}

#[tokio::test]
async fn missing_mjml_package_fails_startup() {
    if !node_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let empty_modules = dir.path().join("empty");
    std::fs::create_dir(&empty_modules).unwrap();
    let config = NodeConfig::default().with_node_path(vec![empty_modules]);
    let invoker =
        NodeInvoker::with_materialize_options(config, &MaterializeOptions::in_dir(dir.path()))
            .unwrap();

    let result = RenderBridge::start(
        invoker,
        BridgeOptions {
            scratch_dir: Some(dir.path().to_path_buf()),
            ..BridgeOptions::default()
        },
    )
    .await;

    match result {
        Err(BridgeError::Invocation(InvokeError::Script { message, .. })) => {
            assert!(message.contains("mjml"), "unexpected message: {message}");
        }
        Err(other) => panic!("expected script failure, got {other:?}"),
        Ok(_) => panic!("startup should fail without the mjml package"),
    }

    // only the empty node_path dir is left; both materialized scripts are gone
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("empty")]);
}

#[tokio::test]
async fn promise_returning_mjml_is_awaited() {
    if !node_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let bridge = start_bridge_with(dir.path(), RenderDefaults::default(), ASYNC_STUB_MJML).await;

    let response = bridge
        .render("<mjml><mj-body></mj-body></mjml>")
        .await
        .unwrap();
    assert!(response.html.starts_with("<html data-async=1>"));
    assert!(response.html.contains(r#""minify":false"#));
    assert!(!response.has_errors());

    let err = bridge.render("<mjml><explode/></mjml>").await.unwrap_err();
    match err {
        BridgeError::Invocation(InvokeError::Script { message, .. }) => {
            assert_eq!(message, "Malformed MJML");
        }
        other => panic!("expected script failure, got {other:?}"),
    }

    bridge.shutdown().await;
}
