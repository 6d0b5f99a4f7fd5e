//! Editor session runs against the in-memory graph API.

use std::sync::Arc;

use tradex_core::{Action, Position, StrategyId};
use tradex_editor::{Command, Control, EditStep, EditorSession, SessionScript};
use tradex_graph::{GraphCall, MockGraphApi};
use tradex_history::{HistoryConfig, HistoryOutcome};

fn setup() -> (Arc<MockGraphApi>, EditorSession) {
    let api = Arc::new(MockGraphApi::new());
    let session = EditorSession::new(StrategyId::new("s1"), api.clone(), &HistoryConfig::default());
    (api, session)
}

fn add(tool_type: &str) -> Command {
    Command::Edit(EditStep::AddNode {
        tool_type: tool_type.to_string(),
        position: Position::new(10.0, 20.0),
    })
}

fn undo() -> Command {
    Command::Control(Control::Undo)
}

fn redo() -> Command {
    Command::Control(Control::Redo)
}

#[tokio::test]
async fn test_add_connect_undo_redo() {
    let (api, mut session) = setup();

    session.execute(&add("indicator")).await.unwrap();
    session.execute(&add("signal")).await.unwrap();
    let outcome = session
        .execute(&Command::Edit(EditStep::Connect {
            source: "$0".to_string(),
            target: "$1".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(outcome, HistoryOutcome::Applied);
    assert_eq!(session.model().edge_count(), 1);
    let edge_id = match session.history().peek_undo().map(|entry| entry.action) {
        Some(Action::AddEdge { edge }) => edge.id,
        other => panic!("unexpected entry: {other:?}"),
    };
    assert!(session.model().edge(&edge_id).is_some());
    assert!(api.has_edge(&edge_id));

    assert_eq!(session.execute(&undo()).await.unwrap(), HistoryOutcome::Applied);
    assert_eq!(session.model().edge_count(), 0);
    assert!(!api.has_edge(&edge_id));

    assert_eq!(session.execute(&redo()).await.unwrap(), HistoryOutcome::Applied);
    assert_eq!(session.model().edge_count(), 1);
    assert!(api.has_edge(&edge_id));
    assert_eq!(session.history().undo_len(), 3);
    assert_eq!(session.history().redo_len(), 0);
}

#[tokio::test]
async fn test_undo_delete_remaps_created_ids() {
    let (api, mut session) = setup();

    session.execute(&add("indicator")).await.unwrap();
    assert_eq!(session.created(), ["node-1".to_string()]);

    session
        .execute(&Command::Edit(EditStep::DeleteNode {
            node_id: "$0".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(session.model().node_count(), 0);
    assert!(api.node("node-1").is_none());

    assert_eq!(session.execute(&undo()).await.unwrap(), HistoryOutcome::Applied);
    assert_eq!(session.created(), ["node-2".to_string()]);
    assert!(session.model().node("node-2").is_some());
    assert!(api.node("node-2").is_some());

    // Older entries now point at the re-created node
    assert_eq!(session.execute(&undo()).await.unwrap(), HistoryOutcome::Applied);
    assert!(api.nodes().is_empty());
    assert_eq!(session.model().node_count(), 0);
    assert!(matches!(
        api.calls().last(),
        Some(GraphCall::DeleteNode { node_id, .. }) if node_id == "node-2"
    ));
}

#[tokio::test]
async fn test_move_records_previous_position() {
    let (api, mut session) = setup();

    session.execute(&add("indicator")).await.unwrap();
    session
        .execute(&Command::Edit(EditStep::MoveNode {
            node_id: "$0".to_string(),
            to: Position::new(99.0, 1.0),
        }))
        .await
        .unwrap();
    assert_eq!(api.node("node-1").map(|n| n.position), Some(Position::new(99.0, 1.0)));

    session.execute(&undo()).await.unwrap();
    assert_eq!(api.node("node-1").map(|n| n.position), Some(Position::new(10.0, 20.0)));
    assert_eq!(
        session.model().node("node-1").map(|n| n.position),
        Some(Position::new(10.0, 20.0))
    );
}

#[tokio::test]
async fn test_failed_edit_is_not_recorded() {
    let (api, mut session) = setup();
    api.fail_next("service unavailable");

    let result = session.execute(&add("indicator")).await;
    assert!(result.is_err());
    assert!(!session.history().can_undo());
    assert_eq!(session.model().node_count(), 0);
    assert!(session.created().is_empty());
}

#[tokio::test]
async fn test_unknown_reference_is_rejected() {
    let (api, mut session) = setup();

    let result = session
        .execute(&Command::Edit(EditStep::DeleteNode {
            node_id: "$3".to_string(),
        }))
        .await;
    assert!(result.is_err());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_batch_applies_and_tracks_created_nodes() {
    let (api, mut session) = setup();
    session.execute(&add("indicator")).await.unwrap();

    let batch = Command::Control(Control::Batch {
        actions: vec![
            EditStep::AddNode {
                tool_type: "video".to_string(),
                position: Position::default(),
            },
            EditStep::MoveNode {
                node_id: "$0".to_string(),
                to: Position::new(3.0, 4.0),
            },
        ],
    });
    assert_eq!(session.execute(&batch).await.unwrap(), HistoryOutcome::Applied);

    assert_eq!(session.created().len(), 2);
    assert_eq!(session.model().node_count(), 2);
    assert_eq!(api.nodes().len(), 2);
    assert_eq!(session.history().undo_len(), 3);
    assert_eq!(
        session.model().node("node-1").map(|n| n.position),
        Some(Position::new(3.0, 4.0))
    );
}

#[tokio::test]
async fn test_batch_failure_leaves_history_unchanged() {
    let (api, mut session) = setup();
    session.execute(&add("indicator")).await.unwrap();
    api.fail_nth(1, "boom");

    let batch = Command::Control(Control::Batch {
        actions: vec![
            EditStep::AddNode {
                tool_type: "video".to_string(),
                position: Position::default(),
            },
            EditStep::AddNode {
                tool_type: "chart".to_string(),
                position: Position::default(),
            },
        ],
    });
    let outcome = session.execute(&batch).await.unwrap();
    match &outcome {
        HistoryOutcome::Partial { applied, .. } => assert_eq!(applied.len(), 1),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.history().undo_len(), 1);

    // the video node exists remotely, so the canvas shows it and it can be referenced
    assert_eq!(session.created(), ["node-1".to_string(), "node-2".to_string()]);
    assert_eq!(session.model().node_count(), 2);
    assert_eq!(session.model().node("node-2").map(|n| n.tool_type()), Some("video"));
    assert_eq!(api.nodes().len(), 2);
}

#[tokio::test]
async fn test_batch_larger_than_max_depth_keeps_every_created_node() {
    let api = Arc::new(MockGraphApi::new());
    let mut session =
        EditorSession::new(StrategyId::new("s1"), api.clone(), &HistoryConfig { max_depth: 1 });

    let batch = Command::Control(Control::Batch {
        actions: vec![
            EditStep::AddNode {
                tool_type: "video".to_string(),
                position: Position::default(),
            },
            EditStep::AddNode {
                tool_type: "chart".to_string(),
                position: Position::default(),
            },
        ],
    });
    assert_eq!(session.execute(&batch).await.unwrap(), HistoryOutcome::Applied);

    assert_eq!(session.history().undo_len(), 1);
    assert_eq!(session.created(), ["node-1".to_string(), "node-2".to_string()]);
    assert_eq!(session.model().node_count(), 2);
    assert!(session.model().node("pending-0").is_none());
    assert_eq!(session.model().node("node-1").map(|n| n.tool_type()), Some("video"));
}

#[tokio::test]
async fn test_run_script_report() {
    let (api, mut session) = setup();
    let script = SessionScript::from_json(
        r#"{
            "commands": [
                {"op": "undo"},
                {"op": "add_node", "tool_type": "indicator", "position": {"x": 1, "y": 2}},
                {"op": "add_node", "tool_type": "signal"},
                {"op": "connect", "source": "$0", "target": "$1"},
                {"op": "upload_file", "node_id": "$1", "file_url": "https://files/a.csv"},
                {"op": "undo"},
                {"op": "delete_node", "node_id": "missing"},
                {"op": "redo"}
            ]
        }"#,
    )
    .unwrap();

    let report = session.run(&script).await;
    let results: Vec<&str> = report.commands.iter().map(|c| c.result.as_str()).collect();
    assert_eq!(
        results,
        [
            "nothing_to_do",
            "applied",
            "applied",
            "applied",
            "applied",
            "applied",
            "failed",
            "applied"
        ]
    );
    assert_eq!(report.commands[6].op, "delete_node");
    assert!(report.commands[6].detail.is_some());
    assert_eq!(report.undo_depth, 4);
    assert_eq!(report.redo_depth, 0);
    assert_eq!(report.nodes, 2);
    assert_eq!(report.edges, 1);
    assert_eq!(api.files("node-2"), vec!["https://files/a.csv".to_string()]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["strategy_id"], "s1");
    assert_eq!(json["commands"][0]["op"], "undo");
}
