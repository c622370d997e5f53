// 该文件是 Zitai （姿态） 项目的一部分。
// src/state.rs - 会话状态仓库
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::sync::Mutex;

use crate::pose::DetectionFrame;

/// 跟踪会话状态快照；每次转换整体替换，从不就地修改
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingState {
  pub active: bool,
  pub loading: bool,
  /// 仅初始化错误会写入此字段；瞬态推理错误不会
  pub error: Option<String>,
  pub last_frame: Option<DetectionFrame>,
  /// 恒由在场判定策略从 last_frame 推导
  pub person_present: bool,
}

impl TrackingState {
  /// UI 显示用的姿态数量
  pub fn detection_count(&self) -> usize {
    self.last_frame.as_ref().map(DetectionFrame::pose_count).unwrap_or(0)
  }
}

/// 状态仓库：UI 侧的唯一事实来源。
/// 读取对所有组件开放，写入只留给循环控制器。
#[derive(Debug, Default)]
pub struct StateStore {
  inner: Mutex<TrackingState>,
}

impl StateStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// 当前状态快照
  pub fn snapshot(&self) -> TrackingState {
    self.inner.lock().expect("状态锁中毒").clone()
  }

  pub fn is_active(&self) -> bool {
    self.inner.lock().expect("状态锁中毒").active
  }

  fn swap(&self, next: TrackingState) {
    *self.inner.lock().expect("状态锁中毒") = next;
  }

  /// idle -> loading：start 调用时、推理服务就绪前
  pub(crate) fn begin_loading(&self) {
    self.swap(TrackingState {
      loading: true,
      ..TrackingState::default()
    });
  }

  /// loading -> error：初始化失败，可由用户重试
  pub(crate) fn fail_loading(&self, message: impl Into<String>) {
    self.swap(TrackingState {
      error: Some(message.into()),
      ..TrackingState::default()
    });
  }

  /// loading -> active：首个周期排定成功
  pub(crate) fn activate(&self) {
    self.swap(TrackingState {
      active: true,
      ..TrackingState::default()
    });
  }

  /// active -> active：落地一个成功周期的检测结果
  pub(crate) fn record_cycle(&self, frame: DetectionFrame, person_present: bool) {
    let mut guard = self.inner.lock().expect("状态锁中毒");
    if !guard.active {
      // stop 之后迟到的结果不落地
      return;
    }
    *guard = TrackingState {
      active: true,
      loading: false,
      error: None,
      last_frame: Some(frame),
      person_present,
    };
  }

  /// active -> idle：stop 时清空检测结果
  pub(crate) fn deactivate(&self) {
    self.swap(TrackingState::default());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pose::{Keypoint, KeypointName, Pose};

  fn one_pose_frame() -> DetectionFrame {
    DetectionFrame::new(vec![Pose::new(vec![Keypoint::new(
      KeypointName::Nose,
      1.0,
      2.0,
      0.9,
    )])])
  }

  #[test]
  fn full_lifecycle_transitions() {
    let store = StateStore::new();
    assert_eq!(store.snapshot(), TrackingState::default());

    store.begin_loading();
    let state = store.snapshot();
    assert!(state.loading && !state.active);

    store.activate();
    let state = store.snapshot();
    assert!(state.active && !state.loading);

    store.record_cycle(one_pose_frame(), true);
    let state = store.snapshot();
    assert!(state.active);
    assert!(state.person_present);
    assert_eq!(state.detection_count(), 1);

    store.deactivate();
    let state = store.snapshot();
    assert!(!state.active);
    assert!(state.last_frame.is_none());
    assert!(!state.person_present);
  }

  #[test]
  fn failed_loading_is_retryable() {
    let store = StateStore::new();
    store.begin_loading();
    store.fail_loading("模型加载失败");

    let state = store.snapshot();
    assert!(!state.active && !state.loading);
    assert_eq!(state.error.as_deref(), Some("模型加载失败"));

    // 再次 start 清除上一次的错误
    store.begin_loading();
    assert!(store.snapshot().error.is_none());
  }

  #[test]
  fn cycle_results_are_dropped_when_inactive() {
    let store = StateStore::new();
    store.record_cycle(one_pose_frame(), true);
    let state = store.snapshot();
    assert!(state.last_frame.is_none());
    assert!(!state.person_present);
  }

  #[test]
  fn snapshot_is_detached_from_store() {
    let store = StateStore::new();
    store.activate();
    let mut snapshot = store.snapshot();
    snapshot.active = false;
    assert!(store.is_active());
  }
}
