// 该文件是 Zitai （姿态） 项目的一部分。
// src/validate.rs - 检测有效性判定
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

use crate::pose::{DetectionFrame, KEYPOINT_CONFIDENCE_BAR};

/// 单个姿态至少需要多少个可信关键点才算检测到人
pub const MIN_CONFIDENT_KEYPOINTS: usize = 5;

/// 在场判定策略：纯函数，无副作用，同帧输入结果恒定
#[derive(Debug, Clone, Copy)]
pub struct PresencePolicy {
  /// 关键点置信度下限（严格大于）
  pub confidence_bar: f32,
  /// 可信关键点数量下限（大于等于）
  pub min_keypoints: usize,
}

impl Default for PresencePolicy {
  fn default() -> Self {
    Self {
      confidence_bar: KEYPOINT_CONFIDENCE_BAR,
      min_keypoints: MIN_CONFIDENT_KEYPOINTS,
    }
  }
}

impl PresencePolicy {
  /// 只要有一个姿态达到可信关键点数量下限，就认为有人在场
  pub fn is_person_present(&self, frame: &DetectionFrame) -> bool {
    if frame.is_empty() {
      return false;
    }
    frame
      .poses
      .iter()
      .any(|pose| pose.confident_count(self.confidence_bar) >= self.min_keypoints)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pose::{Keypoint, KeypointName, Pose};

  const NAMES: [KeypointName; 6] = [
    KeypointName::Nose,
    KeypointName::LeftEye,
    KeypointName::RightEye,
    KeypointName::LeftShoulder,
    KeypointName::RightShoulder,
    KeypointName::LeftHip,
  ];

  fn pose_with(count: usize, confidence: f32) -> Pose {
    let keypoints = NAMES[..count]
      .iter()
      .map(|&name| Keypoint::new(name, 0.0, 0.0, confidence))
      .collect();
    Pose::new(keypoints)
  }

  #[test]
  fn empty_frame_has_no_person() {
    let policy = PresencePolicy::default();
    assert!(!policy.is_person_present(&DetectionFrame::default()));
  }

  #[test]
  fn five_keypoints_above_bar_count_as_person() {
    let policy = PresencePolicy::default();
    let frame = DetectionFrame::new(vec![pose_with(5, 0.31)]);
    assert!(policy.is_person_present(&frame));
  }

  #[test]
  fn four_keypoints_are_not_enough() {
    let policy = PresencePolicy::default();
    let frame = DetectionFrame::new(vec![pose_with(4, 0.9)]);
    assert!(!policy.is_person_present(&frame));
  }

  #[test]
  fn confidence_bar_is_strict() {
    let policy = PresencePolicy::default();
    // 恰好等于 0.3 不达标
    let at_bar = DetectionFrame::new(vec![pose_with(5, 0.3)]);
    assert!(!policy.is_person_present(&at_bar));
    // 刚刚超过即达标
    let above_bar = DetectionFrame::new(vec![pose_with(5, 0.30001)]);
    assert!(policy.is_person_present(&above_bar));
  }

  #[test]
  fn any_single_qualifying_pose_is_enough() {
    let policy = PresencePolicy::default();
    let frame = DetectionFrame::new(vec![pose_with(2, 0.9), pose_with(5, 0.5)]);
    assert!(policy.is_person_present(&frame));
  }
}
