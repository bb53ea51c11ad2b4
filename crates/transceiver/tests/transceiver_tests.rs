//! Rig lifecycle, start backoff and the per-frame exchange against a
//! scripted rig.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use common::{FakeLauncher, RecordingRenderer, build_dir, transceiver, universe_dir};
use rigbridge_ipc::{Color32, RemoteSetting, RespondMessage};
use rigbridge_transceiver::{
    BackoffConfig, CallFrame, LinkError, RenderOptions, RigConfig, RigProcessState,
    RigTransceiver, TransceiverError,
};

fn start(rig: &mut RigTransceiver<FakeLauncher>, frame: u64) -> Result<(), TransceiverError> {
    rig.start(frame, build_dir(), universe_dir())
}

fn exchange(rig: &mut RigTransceiver<FakeLauncher>) -> RespondMessage {
    rig.call(&CallFrame::default()).unwrap();
    rig.respond(None, &RenderOptions::default()).unwrap().clone()
}

#[test]
fn test_start_launches_with_build_and_universe_paths() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);

    start(&mut rig, 0).unwrap();

    assert_eq!(rig.state(), RigProcessState::Running);
    assert!(rig.is_running());
    let launches = launcher.script.lock().unwrap().launches.clone();
    assert_eq!(
        launches,
        vec![(build_dir().to_path_buf(), universe_dir().to_path_buf())]
    );
}

#[test]
fn test_start_is_only_valid_when_not_running() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();

    let err = start(&mut rig, 1).unwrap_err();
    assert_eq!(
        err,
        TransceiverError::invalid_state("start", RigProcessState::Running)
    );
    assert_eq!(launcher.attempt_count(), 1);
}

#[test]
fn test_failed_start_postpones_retry_without_spawning() {
    let launcher = FakeLauncher::failing();
    let mut rig = transceiver(&launcher);

    assert!(matches!(
        start(&mut rig, 100),
        Err(TransceiverError::Launch(_))
    ));
    assert_eq!(rig.state(), RigProcessState::NotRunning);
    assert_eq!(rig.fail_count(), 1);

    // Within 10 frames: no spawn, no extra failure.
    assert_eq!(
        start(&mut rig, 105),
        Err(TransceiverError::BackoffPending { next_frame: 131 })
    );
    assert_eq!(
        start(&mut rig, 130),
        Err(TransceiverError::BackoffPending { next_frame: 131 })
    );
    assert_eq!(launcher.attempt_count(), 1);
    assert_eq!(rig.fail_count(), 1);
    assert_eq!(rig.state(), RigProcessState::NotRunning);

    assert!(matches!(
        start(&mut rig, 131),
        Err(TransceiverError::Launch(_))
    ));
    assert_eq!(launcher.attempt_count(), 2);
    assert_eq!(rig.fail_count(), 2);
}

#[test]
fn test_sixteen_failures_switch_to_slow_retry() {
    let launcher = FakeLauncher::failing();
    let mut rig = transceiver(&launcher);

    let mut frame = 0;
    let mut last_failure = 0;
    for _ in 0..16 {
        assert!(matches!(
            start(&mut rig, frame),
            Err(TransceiverError::Launch(_))
        ));
        last_failure = frame;
        frame += 31;
    }
    assert_eq!(rig.fail_count(), 16);

    for offset in [31, 1000, 6000] {
        assert_eq!(
            start(&mut rig, last_failure + offset),
            Err(TransceiverError::BackoffPending {
                next_frame: last_failure + 6001
            })
        );
    }
    assert_eq!(launcher.attempt_count(), 16);

    launcher.set_failing(false);
    start(&mut rig, last_failure + 6001).unwrap();
    assert_eq!(launcher.attempt_count(), 17);
}

#[test]
fn test_retries_never_give_up() {
    let launcher = FakeLauncher::failing();
    let mut rig = transceiver(&launcher);

    let mut frame = 0;
    for _ in 0..40 {
        while start(&mut rig, frame).is_err_and(|e| {
            matches!(e, TransceiverError::BackoffPending { .. })
        }) {
            frame += 1;
        }
    }
    assert_eq!(launcher.attempt_count(), 40);
    assert_eq!(rig.fail_count(), 40);
}

#[test]
fn test_successful_start_resets_failures() {
    let launcher = FakeLauncher::failing();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap_err();
    assert_eq!(rig.backoff().fail_frame(), Some(0));

    launcher.set_failing(false);
    start(&mut rig, 31).unwrap();

    assert_eq!(rig.fail_count(), 0);
    assert_eq!(rig.backoff().fail_frame(), None);
}

#[test]
fn test_abort_always_ends_not_running_and_is_no_failure() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);

    rig.abort();
    assert_eq!(rig.state(), RigProcessState::NotRunning);

    start(&mut rig, 0).unwrap();
    rig.abort();
    assert_eq!(rig.state(), RigProcessState::NotRunning);
    assert_eq!(launcher.kill_count(), 1);
    assert_eq!(rig.fail_count(), 0);

    // Abort does not schedule a backoff.
    start(&mut rig, 1).unwrap();
    assert_eq!(rig.state(), RigProcessState::Running);
}

#[test]
fn test_abort_keeps_pending_backoff() {
    let launcher = FakeLauncher::failing();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 50).unwrap_err();

    rig.abort();

    assert_eq!(rig.fail_count(), 1);
    assert!(matches!(
        start(&mut rig, 60),
        Err(TransceiverError::BackoffPending { .. })
    ));
}

#[test]
fn test_exchange_requires_running_rig() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);

    assert_eq!(
        rig.call(&CallFrame::default()),
        Err(TransceiverError::invalid_state(
            "call",
            RigProcessState::NotRunning
        ))
    );
    assert!(matches!(
        rig.respond(None, &RenderOptions::default()),
        Err(TransceiverError::InvalidState { .. })
    ));

    start(&mut rig, 0).unwrap();
    assert!(matches!(
        rig.respond(None, &RenderOptions::default()),
        Err(TransceiverError::NoPendingRespond)
    ));
    assert!(launcher.calls().is_empty());
}

#[test]
fn test_respond_frames_are_monotonic() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();

    let frames: Vec<u64> = (0..25).map(|_| exchange(&mut rig).global_frame).collect();

    assert!(frames.windows(2).all(|pair| pair[0] <= pair[1]));
    let seqs: Vec<u64> = launcher.calls().iter().map(|(seq, _)| *seq).collect();
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_each_respond_answers_its_own_call() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();

    exchange(&mut rig);
    rig.respond(None, &RenderOptions::default()).unwrap_err();
    assert_eq!(launcher.calls().len(), 1);
}

#[test]
fn test_frozen_render_reproduces_last_respond() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    let mut renderer = RecordingRenderer::default();
    start(&mut rig, 0).unwrap();

    launcher.queue_reply(Ok(RespondMessage {
        global_frame: 77,
        sky_top: Color32::new(1, 2, 3, 255),
        sky_bottom: Color32::new(4, 5, 6, 255),
        cursor_index: Some(3),
        ..RespondMessage::default()
    }));
    rig.call(&CallFrame::default()).unwrap();
    rig.respond(Some(&mut renderer), &RenderOptions::default())
        .unwrap();
    let live = renderer.frames[0].clone();

    rig.abort();
    let frozen = RenderOptions {
        frozen: true,
        ..RenderOptions::default()
    };
    assert!(rig.update_last_responded_render(&mut renderer, &frozen));

    let held = renderer.frames[1].clone();
    assert!(held.frozen);
    assert_eq!(
        common::RenderedFrame {
            frozen: false,
            ..held
        },
        live
    );
    assert_eq!(rig.last_respond().unwrap().global_frame, 77);
}

#[test]
fn test_frozen_render_without_history_draws_nothing() {
    let launcher = FakeLauncher::default();
    let rig = transceiver(&launcher);
    let mut renderer = RecordingRenderer::default();

    assert!(!rig.update_last_responded_render(&mut renderer, &RenderOptions::default()));
    assert!(renderer.frames.is_empty());
}

#[test]
fn test_call_copies_editor_frame() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();

    let frame = CallFrame {
        screen_width: 800,
        screen_height: 600,
        padding_left: 12,
        padding_right: 40,
        requiring_window_index: 2,
        ignore_mouse_input: true,
        draw_collider_gizmos: true,
        ..CallFrame::default()
    };
    rig.call(&frame).unwrap();

    let (_, call) = launcher.calls().pop().unwrap();
    assert_eq!(call.screen_width, 800);
    assert_eq!(call.padding_left, 12);
    assert_eq!(call.padding_right, 40);
    assert_eq!(call.requiring_window_index, 2);
    assert!(call.ignore_mouse_input);
    assert!(call.draw_collider_gizmos);
    assert!(!call.entity_clicker);

    rig.respond(None, &RenderOptions::default()).unwrap();
    rig.call(&CallFrame::default()).unwrap();
    let (_, call) = launcher.calls().pop().unwrap();
    assert!(!call.draw_collider_gizmos);
}

#[test]
fn test_settings_wait_for_a_successful_exchange() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);

    rig.settings_mut().push(10, 1);
    rig.settings_mut().push_scaled(11, 0.5);
    assert_eq!(rig.settings().pending().len(), 2);

    start(&mut rig, 0).unwrap();
    launcher.queue_reply(Err(LinkError::Timeout { timeout_ms: 200 }));
    assert!(matches!(
        rig.call(&CallFrame::default()),
        Err(TransceiverError::Link(LinkError::Timeout { .. }))
    ));
    assert_eq!(rig.state(), RigProcessState::Running);
    assert!(rig.is_awaiting_respond());
    assert_eq!(rig.settings().pending().len(), 2);

    rig.call(&CallFrame::default()).unwrap();
    assert!(rig.settings().is_empty());
    assert!(!rig.is_awaiting_respond());

    let calls = launcher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].1.remote_settings,
        vec![RemoteSetting::new(10, 1), RemoteSetting::new(11, 500)]
    );
}

#[test]
fn test_unanswered_call_is_not_followed_by_another() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();
    rig.settings_mut().push(400, 0);

    for _ in 0..3 {
        launcher.queue_reply(Err(LinkError::Timeout { timeout_ms: 50 }));
        rig.call(&CallFrame::default()).unwrap_err();
    }
    // Pushed while the rig is behind: waits for the next call.
    rig.settings_mut().push(300, 7);

    assert_eq!(launcher.calls().len(), 1);

    // The late respond answers the first call only.
    rig.call(&CallFrame::default()).unwrap();
    assert_eq!(rig.settings().pending(), &[RemoteSetting::new(300, 7)]);
    rig.respond(None, &RenderOptions::default()).unwrap();

    rig.call(&CallFrame::default()).unwrap();
    let calls = launcher.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1.remote_settings, vec![RemoteSetting::new(400, 0)]);
    assert_eq!(calls[1].1.remote_settings, vec![RemoteSetting::new(300, 7)]);
    assert!(calls[0].0 < calls[1].0);
}

#[test]
fn test_abort_forgets_the_unanswered_call() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();

    launcher.queue_reply(Err(LinkError::Timeout { timeout_ms: 50 }));
    rig.call(&CallFrame::default()).unwrap_err();
    rig.abort();
    assert!(!rig.is_awaiting_respond());

    start(&mut rig, 1).unwrap();
    rig.call(&CallFrame::default()).unwrap();
    assert_eq!(launcher.calls().len(), 2);
}

#[test]
fn test_abort_drops_pending_settings() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();
    rig.settings_mut().push_bool(3, true);

    rig.abort();

    assert!(rig.settings().is_empty());
}

#[test]
fn test_dead_rig_moves_to_not_running() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();
    rig.settings_mut().push(1, 1);

    launcher.set_alive(false);

    assert_eq!(
        rig.call(&CallFrame::default()),
        Err(TransceiverError::RigExited)
    );
    assert_eq!(rig.state(), RigProcessState::NotRunning);
    assert_eq!(rig.fail_count(), 0);
    // Not an abort: queued settings survive for the next rig.
    assert_eq!(rig.settings().pending().len(), 1);
}

#[test]
fn test_broken_link_moves_to_not_running() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();

    launcher.queue_reply(Err(LinkError::Disconnected));

    assert!(matches!(
        rig.call(&CallFrame::default()),
        Err(TransceiverError::Link(LinkError::Disconnected))
    ));
    assert_eq!(rig.state(), RigProcessState::NotRunning);
    assert_eq!(launcher.kill_count(), 1);
}

#[test]
fn test_repeated_timeouts_abort_the_rig() {
    let launcher = FakeLauncher::default();
    let config = RigConfig {
        max_unresponsive_frames: 3,
        ..RigConfig::default()
    };
    let mut rig = RigTransceiver::new(launcher.clone(), config, BackoffConfig::default());
    start(&mut rig, 0).unwrap();

    for _ in 0..3 {
        launcher.queue_reply(Err(LinkError::Timeout { timeout_ms: 200 }));
        rig.call(&CallFrame::default()).unwrap_err();
        assert_eq!(rig.state(), RigProcessState::Running);
    }

    // A good frame resets the streak.
    exchange(&mut rig);
    for _ in 0..4 {
        launcher.queue_reply(Err(LinkError::Timeout { timeout_ms: 200 }));
        rig.call(&CallFrame::default()).unwrap_err();
    }
    assert_eq!(rig.state(), RigProcessState::NotRunning);
    assert_eq!(rig.fail_count(), 0);
}

#[test]
fn test_quit_asks_rig_to_shut_down() {
    let launcher = FakeLauncher::default();
    let mut rig = transceiver(&launcher);
    start(&mut rig, 0).unwrap();

    rig.quit();

    assert_eq!(rig.state(), RigProcessState::NotRunning);
    assert_eq!(launcher.shutdown_count(), 1);
    assert_eq!(launcher.kill_count(), 0);
}
