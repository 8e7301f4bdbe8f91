use super::{material, triangle_mesh};
use crate::assets::{BlendMode, PolygonMode};
use crate::foundation::ids::{ShaderId, TextureId};
use crate::render::{
    DrawCommand, RecordingSink, RenderPriority, RenderPriorityQueue, RenderableCollector, StateKey,
};
use crate::scene::Stage;

fn collect_and_draw(stage: &Stage) -> (RenderPriorityQueue, RecordingSink) {
    let mut queue = RenderPriorityQueue::new();
    RenderableCollector::new().collect(stage, &mut queue);
    let mut sink = RecordingSink::new();
    queue.draw(&mut sink);
    (queue, sink)
}

#[test]
fn test_shared_texture_batches_together() {
    let mut stage = Stage::new();
    let shader = ShaderId::from_raw(1);
    let mut actors = Vec::new();
    for texture in [5, 5, 7] {
        let mat = material(&mut stage, shader, 1, Some(TextureId::from_raw(texture)));
        let mesh = triangle_mesh(&mut stage, mat);
        actors.push(stage.new_actor_with_mesh(mesh).unwrap());
    }

    let (queue, sink) = collect_and_draw(&stage);

    let main = queue.queue(RenderPriority::MAIN).unwrap();
    assert_eq!(main.batch_count(), 2);
    assert_eq!(main.entry_count(), 3);

    let shader_key = StateKey::Shader(shader);
    let depth = StateKey::Depth { test: true, write: true };
    let blend = StateKey::Blend(BlendMode::None);
    let fill = StateKey::RenderSettings(PolygonMode::Fill);
    let tex5 = StateKey::Texture { unit: 0, texture: TextureId::from_raw(5) };
    let tex7 = StateKey::Texture { unit: 0, texture: TextureId::from_raw(7) };
    let draw = |i: usize| DrawCommand::Draw {
        node: actors[i],
        mesh: stage.node(actors[i]).unwrap().mesh().unwrap(),
        submesh: 0,
        iteration: 0,
    };

    let expected = vec![
        DrawCommand::BeginPass { priority: RenderPriority::MAIN, pass: 0 },
        DrawCommand::Apply(shader_key),
        DrawCommand::Apply(depth),
        DrawCommand::Apply(blend),
        DrawCommand::Apply(fill),
        DrawCommand::Apply(tex5),
        draw(0),
        draw(1),
        DrawCommand::Restore(tex5),
        DrawCommand::Apply(tex7),
        draw(2),
        DrawCommand::Restore(tex7),
        DrawCommand::Restore(fill),
        DrawCommand::Restore(blend),
        DrawCommand::Restore(depth),
        DrawCommand::Restore(shader_key),
        DrawCommand::EndPass { priority: RenderPriority::MAIN, pass: 0 },
    ];
    assert_eq!(sink.commands(), expected.as_slice());
}

#[test]
fn test_priorities_then_passes() {
    let mut stage = Stage::new();
    let shader = ShaderId::from_raw(1);
    for priority in [10, 5] {
        let mat = material(&mut stage, shader, 2, None);
        let mesh = triangle_mesh(&mut stage, mat);
        let actor = stage.new_actor_with_mesh(mesh).unwrap();
        stage.node_mut(actor).unwrap().render_priority = RenderPriority::new(priority);
    }

    let (_, sink) = collect_and_draw(&stage);

    let five = RenderPriority::new(5);
    let ten = RenderPriority::new(10);
    assert_eq!(sink.passes(), vec![(five, 0), (five, 1), (ten, 0), (ten, 1)]);
    assert_eq!(sink.draw_count(), 4);
}

#[test]
fn test_identical_state_shares_one_leaf() {
    let mut stage = Stage::new();
    let mat = material(&mut stage, ShaderId::from_raw(3), 1, None);
    let mesh = triangle_mesh(&mut stage, mat);
    stage.new_actor_with_mesh(mesh).unwrap();
    stage.new_actor_with_mesh(mesh).unwrap();

    let (queue, sink) = collect_and_draw(&stage);

    let stats = queue.stats();
    assert_eq!(stats.batches, 1);
    assert_eq!(stats.entries, 2);
    // four chain keys applied once for both draws
    assert_eq!(sink.state_change_count(), 4);
    assert_eq!(sink.draw_count(), 2);
}

#[test]
fn test_queue_rebuilt_each_frame() {
    let mut stage = Stage::new();
    let mat = material(&mut stage, ShaderId::from_raw(1), 1, None);
    let mesh = triangle_mesh(&mut stage, mat);
    let actor = stage.new_actor_with_mesh(mesh).unwrap();

    let collector = RenderableCollector::new();
    let mut queue = RenderPriorityQueue::new();
    collector.collect(&stage, &mut queue);
    assert_eq!(queue.stats().entries, 1);

    stage.node_mut(actor).unwrap().visible = false;
    queue.clear();
    collector.collect(&stage, &mut queue);
    assert!(queue.is_empty());
}
