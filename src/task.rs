// 该文件是 Zitai （姿态） 项目的一部分。
// src/task.rs - 帧节奏驱动任务
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

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use image::RgbImage;
use tracing::info;

use crate::input::FrameSource;
use crate::model::PoseEstimator;
use crate::overlay::TextPainter;
use crate::state::TrackingState;
use crate::track::{TickOutcome, Tracker};

/// 按宿主帧节奏驱动跟踪循环的任务。
///
/// 每个显示刷新点投递一个 tick；周期完成后才会投递下一个，
/// 推理耗时只会推迟下一个周期，不会产生并发周期。
#[derive(Debug)]
pub struct TrackingTask {
  fps: f64,
  max_cycles: Option<u64>,
}

impl Default for TrackingTask {
  fn default() -> Self {
    Self {
      fps: 30.0,
      max_cycles: None,
    }
  }
}

impl TrackingTask {
  pub fn new(fps: f64) -> Self {
    Self {
      fps,
      max_cycles: None,
    }
  }

  pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
    self.max_cycles = max_cycles;
    self
  }

  /// 驱动循环直到会话停止；每个渲染完成的周期回调一次。
  /// Ctrl-C 通过会话的停止句柄协作式生效。
  pub fn run<S, E, P, F>(&self, tracker: &mut Tracker<S, E, P>, mut on_rendered: F) -> Result<()>
  where
    S: FrameSource,
    E: PoseEstimator,
    P: TextPainter,
    F: FnMut(&RgbImage, &TrackingState) -> Result<()>,
  {
    let interval = Duration::from_secs_f64(1.0 / self.fps.max(1.0));
    let (tx, rx) = mpsc::channel();

    let signal = tracker.stop_signal();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备停止跟踪...");
      signal.request_stop();
      let _ = tx.send(());
    })?;

    info!("开始跟踪任务，帧率 {:.1} fps...", self.fps);
    let mut rendered: u64 = 0;
    loop {
      let tick_start = Instant::now();
      match tracker.tick() {
        TickOutcome::Idle | TickOutcome::Stopped => break,
        TickOutcome::Rendered => {
          rendered += 1;
          let state = tracker.store().snapshot();
          on_rendered(tracker.surface(), &state)?;

          if self.max_cycles.map(|n| rendered >= n).unwrap_or(false) {
            info!("达到指定周期数 {}, 停止跟踪", rendered);
            tracker.stop();
            break;
          }
        }
        TickOutcome::NoFrame | TickOutcome::InferenceFailed => {}
      }

      if rx.try_recv().is_ok() {
        // 中断请求已挂起：跳过节拍等待，让下一个 tick 立即观察到
        continue;
      }

      let elapsed = tick_start.elapsed();
      if elapsed < interval {
        thread::sleep(interval - elapsed);
      }
    }

    info!("跟踪任务退出，共渲染 {} 帧", rendered);
    Ok(())
  }
}
