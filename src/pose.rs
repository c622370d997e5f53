// 该文件是 Zitai （姿态） 项目的一部分。
// src/pose.rs - 姿态数据模型
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

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 关键点置信度下限：严格大于该值才视为可信
pub const KEYPOINT_CONFIDENCE_BAR: f32 = 0.3;

/// MoveNet 风格的 17 个人体关键点名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KeypointName {
  Nose,
  LeftEye,
  RightEye,
  LeftEar,
  RightEar,
  LeftShoulder,
  RightShoulder,
  LeftElbow,
  RightElbow,
  LeftWrist,
  RightWrist,
  LeftHip,
  RightHip,
  LeftKnee,
  RightKnee,
  LeftAnkle,
  RightAnkle,
}

impl KeypointName {
  pub const COUNT: usize = 17;

  /// snake_case 名称，用于标签绘制与 JSON 记录
  pub fn as_str(&self) -> &'static str {
    match self {
      KeypointName::Nose => "nose",
      KeypointName::LeftEye => "left_eye",
      KeypointName::RightEye => "right_eye",
      KeypointName::LeftEar => "left_ear",
      KeypointName::RightEar => "right_ear",
      KeypointName::LeftShoulder => "left_shoulder",
      KeypointName::RightShoulder => "right_shoulder",
      KeypointName::LeftElbow => "left_elbow",
      KeypointName::RightElbow => "right_elbow",
      KeypointName::LeftWrist => "left_wrist",
      KeypointName::RightWrist => "right_wrist",
      KeypointName::LeftHip => "left_hip",
      KeypointName::RightHip => "right_hip",
      KeypointName::LeftKnee => "left_knee",
      KeypointName::RightKnee => "right_knee",
      KeypointName::LeftAnkle => "left_ankle",
      KeypointName::RightAnkle => "right_ankle",
    }
  }
}

impl fmt::Display for KeypointName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 单个关键点；推理服务返回后不再修改
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
  pub name: KeypointName,
  /// 源帧像素坐标 X
  pub x: f32,
  /// 源帧像素坐标 Y
  pub y: f32,
  /// 置信度 (0.0 - 1.0)
  pub confidence: f32,
}

impl Keypoint {
  pub fn new(name: KeypointName, x: f32, y: f32, confidence: f32) -> Self {
    Self {
      name,
      x,
      y,
      confidence,
    }
  }

  /// 置信度是否严格超过下限
  pub fn is_confident(&self, bar: f32) -> bool {
    self.confidence > bar
  }
}

/// 单个被检测对象的关键点集合
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
  pub keypoints: Vec<Keypoint>,
}

impl Pose {
  pub fn new(keypoints: Vec<Keypoint>) -> Self {
    Self { keypoints }
  }

  /// 按名称查找关键点
  pub fn keypoint(&self, name: KeypointName) -> Option<&Keypoint> {
    self.keypoints.iter().find(|kp| kp.name == name)
  }

  /// 严格超过置信度下限的关键点数量
  pub fn confident_count(&self, bar: f32) -> usize {
    self.keypoints.iter().filter(|kp| kp.is_confident(bar)).count()
  }
}

/// 一次推理周期产出的全部姿态；被下一周期整体取代，从不合并
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionFrame {
  pub poses: Vec<Pose>,
}

impl DetectionFrame {
  pub fn new(poses: Vec<Pose>) -> Self {
    Self { poses }
  }

  pub fn pose_count(&self) -> usize {
    self.poses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.poses.is_empty()
  }
}

/// 骨架连接表；两端关键点都可信时才绘制连线
pub const SKELETON_EDGES: [(KeypointName, KeypointName); 16] = [
  // 面部
  (KeypointName::Nose, KeypointName::LeftEye),
  (KeypointName::Nose, KeypointName::RightEye),
  (KeypointName::LeftEye, KeypointName::LeftEar),
  (KeypointName::RightEye, KeypointName::RightEar),
  // 上半身
  (KeypointName::LeftShoulder, KeypointName::RightShoulder),
  (KeypointName::LeftShoulder, KeypointName::LeftElbow),
  (KeypointName::LeftElbow, KeypointName::LeftWrist),
  (KeypointName::RightShoulder, KeypointName::RightElbow),
  (KeypointName::RightElbow, KeypointName::RightWrist),
  // 躯干
  (KeypointName::LeftShoulder, KeypointName::LeftHip),
  (KeypointName::RightShoulder, KeypointName::RightHip),
  (KeypointName::LeftHip, KeypointName::RightHip),
  // 下半身
  (KeypointName::LeftHip, KeypointName::LeftKnee),
  (KeypointName::LeftKnee, KeypointName::LeftAnkle),
  (KeypointName::RightHip, KeypointName::RightKnee),
  (KeypointName::RightKnee, KeypointName::RightAnkle),
];
