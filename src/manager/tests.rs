//! Unit tests for the layer manager

use super::LayerManager;
use crate::error::StackError;
use crate::handle::WindowHandle;
use crate::layer::{LayerLevel, StackState};
use crate::restack::{MockRestacker, RestackRequest, VirtualScreen};
use crate::strategy::StackingMode;

fn w(raw: u32) -> WindowHandle {
    WindowHandle::new(raw)
}

fn ws(raw: &[u32]) -> Vec<WindowHandle> {
    raw.iter().copied().map(WindowHandle::new).collect()
}

fn screen_manager(layers: usize) -> LayerManager<VirtualScreen> {
    LayerManager::new(layers, VirtualScreen::new())
}

#[test]
fn test_new_manager_has_at_least_one_layer() {
    let manager = screen_manager(0);
    assert_eq!(manager.layer_count(), 1);
    assert_eq!(manager.mode(), StackingMode::Eager);
    assert!(manager.is_updatable());
    assert_eq!(manager.size(), 0);
}

#[test]
fn test_insert_anchors_below_last_window_of_upper_layer() {
    let mut manager = screen_manager(3);
    let y = manager.create_item(w(2), 1).unwrap();
    manager.item_mut(y).unwrap().add_window(w(4)).unwrap();
    let x = manager.create_item(w(1), 1).unwrap();
    manager.restacker_mut().take_requests();

    let item = manager.create_item(w(3), 2).unwrap();

    assert_eq!(manager.stacking_order(), ws(&[1, 2, 4, 3]));
    assert_eq!(manager.restacker().order(), ws(&[1, 2, 4, 3]).as_slice());
    assert_eq!(
        manager.restacker().requests(),
        &[RestackRequest::StackBelow {
            anchor: w(4),
            handles: ws(&[3]),
        }]
    );
    assert_eq!(manager.item_above(item), Some(y));
    assert_eq!(manager.item_above(y), Some(x));
}

#[test]
fn test_raise_layer_moves_item_to_front_of_upper_band() {
    let mut manager = screen_manager(3);
    let b = manager.create_item(w(10), 1).unwrap();
    let a = manager.create_item(w(1), 2).unwrap();
    manager.item_mut(a).unwrap().add_window(w(2)).unwrap();
    assert_eq!(manager.restacker().order(), ws(&[10, 1, 2]).as_slice());

    manager.raise_layer(a).unwrap();

    assert_eq!(manager.layer_of(a), Some(1));
    assert_eq!(manager.layer(1).unwrap().front(), Some(a));
    assert_eq!(manager.item_below(a), Some(b));
    assert_eq!(manager.stacking_order(), ws(&[1, 2, 10]));
    assert_eq!(manager.restacker().order(), ws(&[1, 2, 10]).as_slice());
}

#[test]
fn test_raise_and_lower_within_layer() {
    let mut manager = screen_manager(2);
    let c = manager.create_item(w(3), 0).unwrap();
    let _b = manager.create_item(w(2), 0).unwrap();
    let a = manager.create_item(w(1), 0).unwrap();
    assert_eq!(manager.restacker().order(), ws(&[1, 2, 3]).as_slice());
    manager.restacker_mut().take_requests();

    manager.layer_mut(0).unwrap().lower(a).unwrap();
    assert_eq!(manager.stacking_order(), ws(&[2, 3, 1]));
    assert_eq!(manager.restacker().order(), ws(&[2, 3, 1]).as_slice());
    assert_eq!(manager.restacker().requests()[0].anchor(), Some(w(3)));

    manager.layer_mut(0).unwrap().raise(c).unwrap();
    assert_eq!(manager.stacking_order(), ws(&[3, 2, 1]));
    assert_eq!(manager.restacker().order(), ws(&[3, 2, 1]).as_slice());
    assert!(matches!(
        manager.restacker().requests()[1],
        RestackRequest::RaiseToTop { .. }
    ));
}

#[test]
fn test_raise_of_front_item_sends_nothing() {
    let mut manager = screen_manager(1);
    let a = manager.create_item(w(1), 0).unwrap();
    manager.restacker_mut().take_requests();

    manager.item_mut(a).unwrap().raise().unwrap();
    manager.item_mut(a).unwrap().lower().unwrap();

    assert!(manager.restacker().requests().is_empty());
}

#[test]
fn test_raise_below_occupied_upper_layer_uses_anchor() {
    let mut manager = screen_manager(2);
    let _menu = manager.create_item(w(50), 0).unwrap();
    let a = manager.create_item(w(1), 1).unwrap();
    let _b = manager.create_item(w(2), 1).unwrap();
    manager.restacker_mut().take_requests();

    manager.item_mut(a).unwrap().raise().unwrap();

    assert_eq!(manager.restacker().order(), ws(&[50, 1, 2]).as_slice());
    assert_eq!(
        manager.restacker().requests(),
        &[RestackRequest::StackBelow {
            anchor: w(50),
            handles: ws(&[1]),
        }]
    );
}

#[test]
fn test_temp_raise_leaves_model_order_and_marks_dirty() {
    let mut manager = screen_manager(2);
    let _menu = manager.create_item(w(5), 0).unwrap();
    let b = manager.create_item(w(2), 1).unwrap();
    let _a = manager.create_item(w(1), 1).unwrap();
    assert_eq!(manager.restacker().order(), ws(&[5, 1, 2]).as_slice());

    manager.item_mut(b).unwrap().temp_raise().unwrap();

    assert_eq!(manager.restacker().order(), ws(&[5, 2, 1]).as_slice());
    assert_eq!(manager.stacking_order(), ws(&[5, 1, 2]));
    assert_eq!(manager.layer(1).unwrap().state(), StackState::Dirty);

    manager.restack().unwrap();
    assert_eq!(manager.restacker().order(), ws(&[5, 1, 2]).as_slice());
    assert_eq!(manager.layer(1).unwrap().state(), StackState::Clean);
}

#[test]
fn test_temp_raise_of_front_item_on_clean_layer_is_noop() {
    let mut manager = screen_manager(1);
    let _b = manager.create_item(w(2), 0).unwrap();
    let a = manager.create_item(w(1), 0).unwrap();
    manager.restacker_mut().take_requests();

    manager.layer_mut(0).unwrap().temp_raise(a).unwrap();

    assert!(manager.restacker().requests().is_empty());
    assert!(!manager.layer(0).unwrap().needs_restack());
}

#[test]
fn test_temp_raise_on_dirty_layer_reissues_whole_layer() {
    let mut manager = screen_manager(1);
    let c = manager.create_item(w(3), 0).unwrap();
    let b = manager.create_item(w(2), 0).unwrap();
    let _a = manager.create_item(w(1), 0).unwrap();

    manager.layer_mut(0).unwrap().temp_raise(c).unwrap();
    manager.restacker_mut().take_requests();
    manager.layer_mut(0).unwrap().temp_raise(b).unwrap();

    assert_eq!(manager.restacker().order(), ws(&[2, 1, 3]).as_slice());
    assert_eq!(
        manager.restacker().requests(),
        &[RestackRequest::RaiseToTop {
            handles: ws(&[2, 1, 3]),
        }]
    );
}

#[test]
fn test_move_to_layer_clamps_and_skips_same_layer() {
    let mut manager = screen_manager(3);
    let a = manager.create_item(w(1), 1).unwrap();
    manager.restacker_mut().take_requests();

    manager.move_to_layer(a, 1).unwrap();
    assert!(manager.restacker().requests().is_empty());

    manager.move_to_layer(a, 99).unwrap();
    assert_eq!(manager.layer_of(a), Some(2));
    assert!(manager.layer(1).unwrap().is_empty());
}

#[test]
fn test_raise_and_lower_layer_saturate() {
    let mut manager = screen_manager(2);
    let a = manager.create_item(w(1), 0).unwrap();

    manager.raise_layer(a).unwrap();
    assert_eq!(manager.layer_of(a), Some(0));

    manager.lower_layer(a).unwrap();
    manager.lower_layer(a).unwrap();
    assert_eq!(manager.layer_of(a), Some(1));
}

#[test]
fn test_add_to_top_restacks_everything() {
    let mut manager = screen_manager(LayerLevel::COUNT);
    let desktop = manager.create_item(w(9), LayerLevel::DESKTOP.index()).unwrap();
    let panel = manager.create_detached_item(w(7));
    manager.restacker_mut().take_requests();

    manager.add_to_top(panel, LayerLevel::DOCK.index()).unwrap();

    assert_eq!(manager.layer_of(panel), Some(LayerLevel::DOCK.index()));
    assert_eq!(manager.stacking_order(), ws(&[7, 9]));
    let requests = manager.restacker().requests();
    assert_eq!(requests.last(), Some(&RestackRequest::Restack { handles: ws(&[7, 9]) }));

    // already placed
    manager.restacker_mut().take_requests();
    manager.add_to_top(desktop, 0).unwrap();
    assert_eq!(manager.layer_of(desktop), Some(LayerLevel::DESKTOP.index()));
    assert!(manager.restacker().requests().is_empty());
}

#[test]
fn test_remove_sends_nothing_and_detaches() {
    let mut manager = screen_manager(2);
    let a = manager.create_item(w(1), 0).unwrap();
    let b = manager.create_item(w(2), 1).unwrap();
    manager.restacker_mut().take_requests();

    assert!(manager.remove(a));
    assert!(!manager.remove(a));
    assert_eq!(manager.layer_of(a), None);
    assert!(manager.contains_item(a));
    assert_eq!(manager.item_above(b), None);
    assert_eq!(manager.stacking_order(), ws(&[2]));
    assert!(manager.restacker().requests().is_empty());
}

#[test]
fn test_destroyed_ids_never_resolve_again() {
    let mut manager = screen_manager(1);
    let a = manager.create_item(w(1), 0).unwrap();

    let item = manager.destroy_item(a).unwrap();
    assert_eq!(item.windows(), &[w(1)]);
    assert_eq!(item.layer(), None);
    assert!(manager.destroy_item(a).is_none());

    let b = manager.create_item(w(2), 0).unwrap();
    assert_eq!(b.index, a.index);
    assert_ne!(b, a);
    assert!(manager.item(a).is_none());
    assert!(manager.item_mut(a).is_none());
    assert_eq!(manager.item_count(), 1);
}

#[test]
fn test_stale_id_operations_are_noops() {
    let mut manager = screen_manager(2);
    let a = manager.create_item(w(1), 0).unwrap();
    manager.destroy_item(a);
    manager.restacker_mut().take_requests();

    manager.move_to_layer(a, 1).unwrap();
    manager.raise_layer(a).unwrap();
    manager.add_to_top(a, 0).unwrap();
    assert!(!manager.remove(a));
    assert!(manager.layer_mut(0).unwrap().raise(a).is_ok());

    assert_eq!(manager.size(), 0);
    assert!(manager.restacker().requests().is_empty());
}

#[test]
fn test_item_neighbours_cross_layers() {
    let mut manager = screen_manager(4);
    let top = manager.create_item(w(1), 0).unwrap();
    let mid_back = manager.create_item(w(3), 2).unwrap();
    let mid_front = manager.create_item(w(2), 2).unwrap();
    let bottom = manager.create_item(w(4), 3).unwrap();

    assert_eq!(manager.item_above(top), None);
    assert_eq!(manager.item_below(top), Some(mid_front));
    assert_eq!(manager.item_above(mid_front), Some(top));
    assert_eq!(manager.item_below(mid_front), Some(mid_back));
    assert_eq!(manager.item_below(mid_back), Some(bottom));
    assert_eq!(manager.item_below(bottom), None);
    assert_eq!(manager.lowest_item_above_layer(3), Some(mid_back));
    assert_eq!(manager.lowest_item_above_layer(0), None);
    assert_eq!(manager.lowest_item_above_layer(9), None);
}

#[test]
fn test_size_counts_windows() {
    let mut manager = screen_manager(2);
    let a = manager.create_item(w(1), 0).unwrap();
    manager.item_mut(a).unwrap().add_window(w(2)).unwrap();
    manager.create_item(w(3), 1).unwrap();
    manager.create_detached_item(w(4));

    assert_eq!(manager.size(), 3);
    assert_eq!(manager.item_count(), 3);
    assert_eq!(manager.layer_order(0), ws(&[1, 2]));
    assert!(manager.layer_order(5).is_empty());
}

#[test]
fn test_null_handles_are_never_sent() {
    let mut manager = screen_manager(2);
    let top = manager.create_item(w(1), 0).unwrap();
    manager.item_mut(top).unwrap().add_window(WindowHandle::NONE).unwrap();
    let pending = manager.create_item(WindowHandle::NONE, 1).unwrap();
    manager.item_mut(pending).unwrap().add_window(w(2)).unwrap();
    manager.restack().unwrap();

    for request in manager.restacker().requests() {
        assert!(request.handles().iter().all(|h| !h.is_none()));
        assert_ne!(request.anchor(), Some(WindowHandle::NONE));
    }
    assert_eq!(manager.restacker().order(), ws(&[1, 2]).as_slice());
    assert_eq!(manager.size(), 4);
}

#[test]
fn test_item_with_only_null_handles_is_skipped_as_anchor() {
    let mut manager = screen_manager(3);
    manager.create_item(w(1), 0).unwrap();
    manager.create_item(WindowHandle::NONE, 1).unwrap();
    let back = manager.create_item(w(3), 2).unwrap();

    assert_eq!(manager.restacker().order(), ws(&[1, 3]).as_slice());
    assert_eq!(
        manager.restacker().requests().last(),
        Some(&RestackRequest::StackBelow {
            anchor: w(1),
            handles: ws(&[3]),
        })
    );

    manager.create_item(w(4), 2).unwrap();
    manager.item_mut(back).unwrap().temp_raise().unwrap();
    assert_eq!(manager.restacker().order(), ws(&[1, 3, 4]).as_slice());
    let raises = manager
        .restacker()
        .requests()
        .iter()
        .filter(|r| matches!(r, RestackRequest::RaiseToTop { .. }))
        .count();
    assert_eq!(raises, 1);
}

#[test]
fn test_lower_behind_item_with_only_null_handles() {
    let mut manager = screen_manager(2);
    manager.create_item(w(1), 0).unwrap();
    manager.create_item(WindowHandle::NONE, 1).unwrap();
    manager.create_item(w(5), 1).unwrap();
    let front = manager.create_item(w(6), 1).unwrap();
    assert_eq!(manager.restacker().order(), ws(&[1, 6, 5]).as_slice());

    manager.item_mut(front).unwrap().lower().unwrap();

    assert_eq!(manager.stacking_order(), vec![w(1), w(5), WindowHandle::NONE, w(6)]);
    assert_eq!(manager.restacker().order(), ws(&[1, 5, 6]).as_slice());
    assert_eq!(manager.restacker().requests().last().and_then(|r| r.anchor()), Some(w(5)));
}

#[test]
fn test_bring_to_top_reorders_item_windows() {
    let mut manager = screen_manager(1);
    let a = manager.create_item(w(1), 0).unwrap();
    let mut item = manager.item_mut(a).unwrap();
    item.add_window(w(2)).unwrap();
    item.add_window(w(3)).unwrap();
    item.bring_to_top(w(1)).unwrap();
    assert_eq!(item.windows(), ws(&[2, 3, 1]).as_slice());
    assert!(!item.remove_window(w(9)));

    assert_eq!(manager.restacker().order(), ws(&[2, 3, 1]).as_slice());
}

#[test]
fn test_set_layer_through_item_view() {
    let mut manager = screen_manager(3);
    let a = manager.create_item(w(1), 0).unwrap();
    let mut item = manager.item_mut(a).unwrap();
    item.set_layer(2).unwrap();
    assert_eq!(item.layer(), Some(2));
    item.raise_layer().unwrap();
    item.move_to_layer(0).unwrap();
    assert_eq!(item.layer(), Some(0));
    item.lower_layer().unwrap();
    assert_eq!(manager.layer_of(a), Some(1));
}

#[test]
fn test_layer_view_insert_and_remove() {
    let mut manager = screen_manager(2);
    let a = manager.create_detached_item(w(1));
    let mut layer = manager.layer_mut(1).unwrap();
    layer.insert(a).unwrap();
    assert_eq!(layer.lowest_item(), Some(a));
    assert_eq!(layer.layer().len(), 1);
    layer.align(a).unwrap();
    layer.restack().unwrap();
    assert!(layer.remove(a));
    assert!(manager.layer_mut(2).is_none());
    assert_eq!(manager.layer_of(a), None);
}

#[test]
fn test_restacker_failure_marks_layer_dirty() {
    let mut manager = screen_manager(1);
    let b = manager.create_item(w(2), 0).unwrap();
    let _a = manager.create_item(w(1), 0).unwrap();

    manager.restacker_mut().disconnect();
    let err = manager.layer_mut(0).unwrap().raise(b).unwrap_err();
    assert!(matches!(err, StackError::ConnectionLost));
    assert!(manager.layer(0).unwrap().needs_restack());
    assert_eq!(manager.stacking_order(), ws(&[2, 1]));

    manager.restacker_mut().reconnect();
    manager.restacker_mut().take_requests();
    manager.layer_mut(0).unwrap().align(b).unwrap();

    assert!(manager.restacker().requests()[0].is_full());
    assert!(!manager.layer(0).unwrap().needs_restack());
    assert_eq!(manager.restacker().order(), ws(&[2, 1]).as_slice());
}

#[test]
fn test_failed_create_discards_item() {
    let mut screen = VirtualScreen::new();
    screen.disconnect();
    let mut manager = LayerManager::new(1, screen);

    assert!(manager.create_item(w(1), 0).is_err());
    assert_eq!(manager.item_count(), 0);
    assert!(manager.layer(0).unwrap().is_empty());
}

#[test]
fn test_failed_global_restack_marks_every_layer_dirty() {
    let mut manager = screen_manager(3);
    manager.create_item(w(1), 0).unwrap();
    manager.create_item(w(2), 2).unwrap();

    manager.restacker_mut().disconnect();
    assert!(manager.restack().is_err());
    assert!(manager.layers().iter().all(|layer| layer.needs_restack()));

    manager.restacker_mut().reconnect();
    manager.restack().unwrap();
    assert!(manager.layers().iter().all(|layer| !layer.needs_restack()));
}

#[test]
fn test_locked_manager_sends_one_restack_on_final_unlock() {
    let mut mock = MockRestacker::new();
    mock.expect_restack()
        .withf(|handles| handles.to_vec() == ws(&[3, 1, 2]))
        .times(1)
        .returning(|_| Ok(()));
    let mut manager = LayerManager::new(3, mock);

    manager.lock();
    manager.lock();
    let a = manager.create_item(w(1), 1).unwrap();
    let b = manager.create_item(w(2), 2).unwrap();
    let c = manager.create_item(w(3), 0).unwrap();
    manager.item_mut(b).unwrap().temp_raise().unwrap();
    manager.item_mut(a).unwrap().raise().unwrap();
    manager.restack().unwrap();
    assert!(manager.layers().iter().all(|layer| layer.needs_restack()));
    assert!(!manager.is_updatable());

    manager.unlock().unwrap();
    assert!(!manager.is_updatable());
    manager.unlock().unwrap();
    assert!(manager.is_updatable());
    assert_eq!(manager.item_above(a), Some(c));

    // unbalanced unlock is ignored
    manager.unlock().unwrap();
}

#[test]
fn test_deferred_mode_only_sends_global_restacks() {
    let mut mock = MockRestacker::new();
    mock.expect_stack_below().never();
    mock.expect_raise_to_top().never();
    mock.expect_restack()
        .withf(|handles| handles.to_vec() == ws(&[2, 1]))
        .times(1)
        .returning(|_| Ok(()));
    let mut manager = LayerManager::with_mode(2, StackingMode::Deferred, mock);

    let a = manager.create_item(w(1), 1).unwrap();
    let b = manager.create_item(w(2), 1).unwrap();
    manager.item_mut(a).unwrap().raise().unwrap();
    manager.item_mut(a).unwrap().temp_raise().unwrap();
    manager.layer_mut(1).unwrap().lower(a).unwrap();
    assert!(manager.layer(1).unwrap().needs_restack());
    assert_eq!(manager.item_above(a), Some(b));

    manager.restack().unwrap();
    assert!(!manager.layer(1).unwrap().needs_restack());
}

#[test]
fn test_mock_failure_propagates_from_placement() {
    let mut mock = MockRestacker::new();
    mock.expect_raise_to_top()
        .times(1)
        .returning(|_| Ok(()));
    mock.expect_stack_below()
        .times(1)
        .returning(|_, _| Err(StackError::restack("BadWindow")));
    let mut manager = LayerManager::new(2, mock);

    manager.create_item(w(1), 0).unwrap();
    let err = manager.create_item(w(2), 1).unwrap_err();

    assert_eq!(err.to_string(), "restack request failed: BadWindow");
    assert!(manager.layer(1).unwrap().needs_restack());
    assert!(!manager.layer(0).unwrap().needs_restack());
}

#[test]
fn test_from_config() {
    let config = crate::config::StackingConfig {
        layers: 5,
        mode: StackingMode::Deferred,
    };
    let manager = LayerManager::from_config(&config, VirtualScreen::new());
    assert_eq!(manager.layer_count(), 5);
    assert_eq!(manager.mode(), StackingMode::Deferred);
}
