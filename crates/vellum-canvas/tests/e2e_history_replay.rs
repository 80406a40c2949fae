#![forbid(unsafe_code)]

//! End-to-end scenarios: shape commands driven through the full history
//! engine, including persistence across a simulated process restart.

use std::sync::Arc;

use vellum_canvas::{
    Canvas, CanvasHandle, CreateShapeCmd, DeleteShapeCmd, Shape, ShapeId, ShapeKind,
    register_builtin_commands,
};
use vellum_undo::{CommandGroup, CommandRegistry, HistoryManager, HistoryWorkspace};

fn registry_for(canvas: &CanvasHandle) -> Arc<CommandRegistry> {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry, canvas);
    Arc::new(registry)
}

fn create_group(canvas: &CanvasHandle, id: u64, label: &str, x: f64, y: f64) -> CommandGroup {
    let shape = Shape::new(ShapeId::new(id), ShapeKind::Box, label).at(x, y);
    let mut group = CommandGroup::new(format!("create {label}"));
    group.add_command(Box::new(CreateShapeCmd::new(Arc::clone(canvas), shape)));
    group
}

#[test]
fn e2e_edit_session_undo_redo() {
    let dir = tempfile::tempdir().unwrap();
    let canvas = Canvas::shared();
    let registry = registry_for(&canvas);
    let workspace = HistoryWorkspace::new(dir.path());
    let mut history = workspace.create_manager(Arc::clone(&registry)).unwrap();

    // One transaction placing two shapes.
    let mut group = CommandGroup::new("add actor and note");
    group.add_command(Box::new(CreateShapeCmd::new(
        Arc::clone(&canvas),
        Shape::new(ShapeId::new(1), ShapeKind::Box, "actor").at(10.0, 10.0),
    )));
    group.add_command(Box::new(CreateShapeCmd::new(
        Arc::clone(&canvas),
        Shape::new(ShapeId::new(2), ShapeKind::Note, "remember").at(30.0, 5.0),
    )));
    history.add_command_group(group).unwrap();
    history.execute().unwrap();
    assert_eq!(canvas.lock().unwrap().len(), 2);

    // Undo reconstructs the group from the persisted record and reverses
    // both members.
    assert_eq!(history.undo().unwrap(), "add actor and note");
    assert!(canvas.lock().unwrap().is_empty());

    assert_eq!(history.redo().unwrap(), "add actor and note");
    let guard = canvas.lock().unwrap();
    assert_eq!(guard.len(), 2);
    assert!(guard.shape(ShapeId::new(1)).is_some());
    assert!(guard.shape(ShapeId::new(2)).is_some());
}

#[test]
fn e2e_truncation_discards_redo_branch() {
    let dir = tempfile::tempdir().unwrap();
    let canvas = Canvas::shared();
    let registry = registry_for(&canvas);
    let workspace = HistoryWorkspace::new(dir.path());
    let mut history = workspace.create_manager(Arc::clone(&registry)).unwrap();

    for (id, label) in [(1, "a"), (2, "b"), (3, "c")] {
        history
            .add_command_group(create_group(&canvas, id, label, 0.0, 0.0))
            .unwrap();
        history.execute().unwrap();
    }

    history.undo().unwrap();
    history.undo().unwrap();
    assert_eq!(canvas.lock().unwrap().len(), 1);

    // A new edit after two undos forgets the undone branch.
    history
        .add_command_group(create_group(&canvas, 4, "d", 1.0, 1.0))
        .unwrap();
    history.execute().unwrap();

    assert_eq!(history.group_count(), 2);
    assert!(!history.is_redo_possible());
    assert_eq!(history.undo_comment().unwrap().as_deref(), Some("create d"));

    let guard = canvas.lock().unwrap();
    assert!(guard.shape(ShapeId::new(1)).is_some());
    assert!(guard.shape(ShapeId::new(4)).is_some());
    assert!(guard.shape(ShapeId::new(2)).is_none());
    assert!(guard.shape(ShapeId::new(3)).is_none());
}

#[test]
fn e2e_restart_replays_persisted_history() {
    let dir = tempfile::tempdir().unwrap();
    let canvas = Canvas::shared();
    let registry = registry_for(&canvas);
    let path;

    // First session: edit and let the manager go out of scope without
    // destroying the log.
    {
        let workspace = HistoryWorkspace::new(dir.path());
        let mut history = workspace.create_manager(Arc::clone(&registry)).unwrap();
        history
            .add_command_group(create_group(&canvas, 1, "persisted", 2.0, 3.0))
            .unwrap();
        history.execute().unwrap();
        path = history.path().to_path_buf();
    }
    assert_eq!(canvas.lock().unwrap().len(), 1);

    // Second session: resume the log and undo an edit made before the
    // restart.
    let mut history = HistoryManager::open(&path, Arc::clone(&registry)).unwrap();
    assert!(history.is_undo_possible());
    assert_eq!(history.undo_comment().unwrap().as_deref(), Some("create persisted"));

    history.undo().unwrap();
    assert!(canvas.lock().unwrap().is_empty());

    history.redo().unwrap();
    let guard = canvas.lock().unwrap();
    let shape = guard.shape(ShapeId::new(1)).unwrap();
    assert_eq!(shape.x, 2.0);
    assert_eq!(shape.y, 3.0);
}

#[test]
fn e2e_unknown_command_kind_degrades_gracefully() {
    let dir = tempfile::tempdir().unwrap();
    let canvas = Canvas::shared();
    let full_registry = registry_for(&canvas);
    let workspace = HistoryWorkspace::new(dir.path());

    // Seed a shape the transaction will delete.
    canvas.lock().unwrap().add_shape(
        Shape::new(ShapeId::new(100), ShapeKind::Ellipse, "legacy"),
        50.0,
        50.0,
        true,
    );

    let path;
    {
        let mut history = workspace.create_manager(Arc::clone(&full_registry)).unwrap();
        let mut group = CommandGroup::new("rework diagram");
        group.add_command(Box::new(CreateShapeCmd::new(
            Arc::clone(&canvas),
            Shape::new(ShapeId::new(1), ShapeKind::Box, "first"),
        )));
        group.add_command(Box::new(
            DeleteShapeCmd::capture(&canvas, ShapeId::new(100)).unwrap(),
        ));
        group.add_command(Box::new(CreateShapeCmd::new(
            Arc::clone(&canvas),
            Shape::new(ShapeId::new(2), ShapeKind::Box, "second"),
        )));
        history.add_command_group(group).unwrap();
        history.execute().unwrap();
        path = history.path().to_path_buf();
    }
    {
        let guard = canvas.lock().unwrap();
        assert_eq!(guard.len(), 2);
        assert!(guard.shape(ShapeId::new(100)).is_none());
    }

    // A later session that only knows the create command: the delete
    // record cannot resolve, but the group still reconstructs around it.
    let mut limited = CommandRegistry::new();
    let handle = Arc::clone(&canvas);
    limited.register(vellum_canvas::CREATE_SHAPE_KIND, move || {
        Box::new(CreateShapeCmd::unbound(Arc::clone(&handle)))
    });

    let mut history = HistoryManager::open(&path, Arc::new(limited)).unwrap();
    history.undo().unwrap();

    let guard = canvas.lock().unwrap();
    assert!(guard.shape(ShapeId::new(1)).is_none());
    assert!(guard.shape(ShapeId::new(2)).is_none());
    // The skipped delete never replayed, so the legacy shape stays gone.
    assert!(guard.shape(ShapeId::new(100)).is_none());
    assert!(guard.is_empty());
}

#[test]
fn e2e_common_data_flows_within_transaction_only() {
    let dir = tempfile::tempdir().unwrap();
    let canvas = Canvas::shared();
    let registry = registry_for(&canvas);
    let workspace = HistoryWorkspace::new(dir.path());
    let mut history = workspace.create_manager(Arc::clone(&registry)).unwrap();

    // The code assembling the transaction publishes the id the first
    // command will create, and a later step reads it back to build the
    // follow-up command before anything is serialized.
    let mut group = CommandGroup::new("linked create");
    group.add_command(Box::new(CreateShapeCmd::new(
        Arc::clone(&canvas),
        Shape::new(ShapeId::new(7), ShapeKind::Box, "anchor"),
    )));
    group.add_common_data(Box::new(ShapeId::new(7)));

    let anchor = group.common_data()[0]
        .downcast_ref::<ShapeId>()
        .copied()
        .unwrap();
    group.add_command(Box::new(CreateShapeCmd::new(
        Arc::clone(&canvas),
        Shape::new(ShapeId::new(8), ShapeKind::Note, format!("note for {anchor}")),
    )));

    history.add_command_group(group).unwrap();
    history.execute().unwrap();
    assert_eq!(canvas.lock().unwrap().len(), 2);

    // After the round trip through the store, the scratchpad is gone but
    // the commands replay.
    history.undo().unwrap();
    assert!(canvas.lock().unwrap().is_empty());
}
