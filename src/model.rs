// 该文件是 Zitai （姿态） 项目的一部分。
// src/model.rs - 姿态推理服务
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

use image::RgbImage;

use crate::pose::Pose;

/// 姿态推理服务：对核心而言是不透明的外部模型
pub trait PoseEstimator {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 准备模型资产；start 时调用一次，失败属于初始化错误
  fn prepare(&mut self) -> Result<(), Self::Error>;

  /// 对一帧图像做姿态推理；单次失败视为瞬态错误
  fn estimate(&mut self, frame: &RgbImage) -> Result<Vec<Pose>, Self::Error>;
}

#[cfg(feature = "replay")]
mod replay {
  use std::path::PathBuf;

  use image::RgbImage;
  use thiserror::Error;
  use tracing::info;

  use super::PoseEstimator;
  use crate::pose::{DetectionFrame, Pose};

  #[derive(Error, Debug)]
  pub enum ReplayError {
    #[error("无法读取姿态记录 {path}: {source}")]
    Io {
      path: PathBuf,
      #[source]
      source: std::io::Error,
    },
    #[error("姿态记录解析失败: {0}")]
    Parse(#[from] serde_json::Error),
  }

  /// 回放推理服务：从 JSON 记录中按周期回放姿态，
  /// 记录播完后从头循环（演示与联调用，替代真实模型）
  pub struct ReplayEstimator {
    path: Option<PathBuf>,
    frames: Vec<DetectionFrame>,
    cursor: usize,
  }

  impl ReplayEstimator {
    /// 记录文件在 prepare 时才加载，对应模型资产的延迟加载
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
      Self {
        path: Some(path.into()),
        frames: Vec::new(),
        cursor: 0,
      }
    }

    /// 直接给定逐周期的姿态序列
    pub fn from_frames(frames: Vec<DetectionFrame>) -> Self {
      Self {
        path: None,
        frames,
        cursor: 0,
      }
    }

    pub fn frame_count(&self) -> usize {
      self.frames.len()
    }
  }

  impl PoseEstimator for ReplayEstimator {
    type Error = ReplayError;

    fn prepare(&mut self) -> Result<(), Self::Error> {
      let Some(path) = self.path.clone() else {
        return Ok(());
      };

      let raw = std::fs::read_to_string(&path).map_err(|source| ReplayError::Io {
        path: path.clone(),
        source,
      })?;
      self.frames = serde_json::from_str(&raw)?;
      self.cursor = 0;
      info!("姿态记录加载完成: {} ({} 个周期)", path.display(), self.frames.len());
      Ok(())
    }

    fn estimate(&mut self, _frame: &RgbImage) -> Result<Vec<Pose>, Self::Error> {
      if self.frames.is_empty() {
        return Ok(Vec::new());
      }

      let frame = self.frames[self.cursor].clone();
      self.cursor = (self.cursor + 1) % self.frames.len();
      Ok(frame.poses)
    }
  }
}

#[cfg(feature = "replay")]
pub use self::replay::{ReplayEstimator, ReplayError};

#[cfg(all(test, feature = "replay"))]
mod tests {
  use super::*;
  use crate::pose::{DetectionFrame, Keypoint, KeypointName, Pose};

  fn tiny_frame() -> RgbImage {
    RgbImage::new(4, 4)
  }

  #[test]
  fn replay_cycles_through_recorded_frames() {
    let first = DetectionFrame::new(vec![Pose::new(vec![Keypoint::new(
      KeypointName::Nose,
      1.0,
      1.0,
      0.9,
    )])]);
    let second = DetectionFrame::default();
    let mut estimator = ReplayEstimator::from_frames(vec![first.clone(), second]);
    estimator.prepare().unwrap();

    let frame = tiny_frame();
    assert_eq!(estimator.estimate(&frame).unwrap(), first.poses);
    assert!(estimator.estimate(&frame).unwrap().is_empty());
    // 播完后回到开头
    assert_eq!(estimator.estimate(&frame).unwrap(), first.poses);
  }

  #[test]
  fn prepare_parses_recording_file() {
    let json = r#"[
      { "poses": [ { "keypoints": [
        { "name": "nose", "x": 10.0, "y": 20.0, "confidence": 0.8 },
        { "name": "left_eye", "x": 12.0, "y": 18.0, "confidence": 0.7 }
      ] } ] },
      { "poses": [] }
    ]"#;
    let path = std::env::temp_dir().join(format!("zitai-replay-{}.json", std::process::id()));
    std::fs::write(&path, json).unwrap();

    let mut estimator = ReplayEstimator::from_path(&path);
    estimator.prepare().unwrap();
    assert_eq!(estimator.frame_count(), 2);

    let poses = estimator.estimate(&tiny_frame()).unwrap();
    assert_eq!(poses.len(), 1);
    assert_eq!(poses[0].keypoints[0].name, KeypointName::Nose);
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn prepare_fails_on_missing_recording() {
    let mut estimator = ReplayEstimator::from_path("/nonexistent/zitai-poses.json");
    assert!(matches!(estimator.prepare(), Err(ReplayError::Io { .. })));
  }
}
