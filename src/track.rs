// 该文件是 Zitai （姿态） 项目的一部分。
// src/track.rs - 跟踪循环控制器
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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::input::FrameSource;
use crate::model::PoseEstimator;
use crate::overlay::{OverlayRenderer, TextPainter};
use crate::pose::DetectionFrame;
use crate::state::StateStore;
use crate::validate::PresencePolicy;

/// 初始化错误：阻塞且可重试，循环不会启动
#[derive(Error, Debug)]
pub enum StartError {
  #[error("推理服务初始化失败: {0}")]
  Estimator(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("帧源尚无可读帧")]
  FrameSourceNotReady,
}

/// 单个周期的执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
  /// 会话未激活，没有排定的周期
  Idle,
  /// 停止请求已生效，本周期未落地任何结果
  Stopped,
  /// 帧源暂无可读帧：空转周期，立即重新排定
  NoFrame,
  /// 本周期推理失败：已记录日志，循环照常继续
  InferenceFailed,
  /// 完整周期：推理、判定、渲染、状态落地
  Rendered,
}

#[derive(Debug, Default)]
struct SessionFlags {
  stop: AtomicBool,
}

impl SessionFlags {
  fn request_stop(&self) {
    self.stop.store(true, Ordering::SeqCst);
  }

  fn stop_requested(&self) -> bool {
    self.stop.load(Ordering::SeqCst)
  }
}

/// 会话停止句柄：协作式、边沿触发。
/// 停止请求在下一个周期边界、或在途推理返回后生效；
/// 新的 start 会换入新的会话标志，旧句柄随之失效。
#[derive(Clone)]
pub struct StopSignal {
  flags: Arc<SessionFlags>,
}

impl StopSignal {
  pub fn request_stop(&self) {
    self.flags.request_stop();
  }
}

/// 跟踪循环控制器。
///
/// 拥有"取帧 → 推理 → 判定 → 渲染"的持续周期以及会话生命周期：
/// 周期自身完成（含渲染）后才排定下一个周期，同一会话绝不并发；
/// 循环没有自然终止条件，只能由显式 stop 结束。
pub struct Tracker<S, E, P> {
  source: S,
  estimator: E,
  renderer: OverlayRenderer<P>,
  policy: PresencePolicy,
  store: Arc<StateStore>,
  surface: RgbImage,
  flags: Arc<SessionFlags>,
  tick_scheduled: bool,
  cycle: u64,
}

impl<S, E, P> Tracker<S, E, P>
where
  S: FrameSource,
  E: PoseEstimator,
  P: TextPainter,
{
  pub fn new(
    source: S,
    estimator: E,
    renderer: OverlayRenderer<P>,
    store: Arc<StateStore>,
  ) -> Self {
    Self {
      source,
      estimator,
      renderer,
      policy: PresencePolicy::default(),
      store,
      surface: RgbImage::new(0, 0),
      flags: Arc::new(SessionFlags::default()),
      tick_scheduled: false,
      cycle: 0,
    }
  }

  pub fn with_policy(mut self, policy: PresencePolicy) -> Self {
    self.policy = policy;
    self
  }

  /// 状态仓库句柄，供 UI 侧只读消费
  pub fn store(&self) -> Arc<StateStore> {
    Arc::clone(&self.store)
  }

  /// 当前输出表面（已标注的叠加画面）
  pub fn surface(&self) -> &RgbImage {
    &self.surface
  }

  pub fn is_active(&self) -> bool {
    self.store.is_active()
  }

  /// 是否有已排定的周期；active 时恒为一个，否则为零
  pub fn pending_tick(&self) -> bool {
    self.tick_scheduled
  }

  /// 当前会话的停止句柄
  pub fn stop_signal(&self) -> StopSignal {
    StopSignal {
      flags: Arc::clone(&self.flags),
    }
  }

  /// 启动跟踪会话。
  ///
  /// 已激活时是空操作，绝不产生第二个循环。
  /// 推理服务准备失败或帧源无可读帧时返回初始化错误，
  /// 错误写入状态仓库，由用户再次调用 start 重试。
  pub fn start(&mut self) -> Result<(), StartError> {
    if self.store.is_active() {
      return Ok(());
    }

    self.store.begin_loading();

    info!("正在准备姿态推理服务...");
    if let Err(err) = self.estimator.prepare() {
      warn!("推理服务初始化失败: {}", err);
      self.store.fail_loading(err.to_string());
      return Err(StartError::Estimator(Box::new(err)));
    }

    if !self.source.is_ready() {
      let err = StartError::FrameSourceNotReady;
      warn!("{}", err);
      self.store.fail_loading(err.to_string());
      return Err(err);
    }

    // 就绪探测会触发尺寸事件；优先按事件尺寸建立表面，缺省回退到原生尺寸
    if let Some((width, height)) = self
      .source
      .poll_resize()
      .or_else(|| self.source.native_size())
    {
      OverlayRenderer::<P>::resize_surface(&mut self.surface, width, height);
    }

    self.flags = Arc::new(SessionFlags::default());
    self.tick_scheduled = true;
    self.cycle = 0;
    self.store.activate();
    info!("跟踪会话已启动: {}x{}", self.surface.width(), self.surface.height());
    Ok(())
  }

  /// 停止跟踪会话；idle 下是空操作。
  /// 排定的周期被取消，此后任何周期都不会再改动共享状态。
  pub fn stop(&mut self) {
    if !self.store.is_active() {
      return;
    }
    self.flags.request_stop();
    self.finish_stop();
  }

  /// 激活则停止，否则启动
  pub fn toggle(&mut self) -> Result<(), StartError> {
    if self.store.is_active() {
      self.stop();
      Ok(())
    } else {
      self.start()
    }
  }

  fn finish_stop(&mut self) {
    self.tick_scheduled = false;
    self.store.deactivate();
    info!("跟踪会话已停止，共 {} 个周期", self.cycle);
  }

  /// 执行一个周期；宿主在每个显示刷新点调用一次。
  pub fn tick(&mut self) -> TickOutcome {
    if !self.tick_scheduled {
      return TickOutcome::Idle;
    }
    self.tick_scheduled = false;

    if self.flags.stop_requested() {
      self.finish_stop();
      return TickOutcome::Stopped;
    }

    if let Some((width, height)) = self.source.poll_resize() {
      debug!("输出表面尺寸更新: {}x{}", width, height);
      OverlayRenderer::<P>::resize_surface(&mut self.surface, width, height);
    }

    let Some(frame) = self.source.current_frame() else {
      // 空转周期：不推理不渲染，立即重新排定
      self.tick_scheduled = true;
      return TickOutcome::NoFrame;
    };

    self.cycle += 1;
    match self.estimator.estimate(frame) {
      Err(err) => {
        // 单次推理失败绝不终止循环，也不写入状态仓库
        warn!("第 {} 周期推理失败: {}", self.cycle, err);
        if self.flags.stop_requested() {
          // 在途推理以失败返回时，停止同样生效：不再排定周期
          self.finish_stop();
          return TickOutcome::Stopped;
        }
        self.tick_scheduled = true;
        TickOutcome::InferenceFailed
      }
      Ok(poses) => {
        if self.flags.stop_requested() {
          // 在途推理返回时停止已生效：结果丢弃，不再排定
          self.finish_stop();
          return TickOutcome::Stopped;
        }

        let detection = DetectionFrame::new(poses);
        let person_present = self.policy.is_person_present(&detection);
        self.renderer.render(&mut self.surface, frame, &detection, person_present);
        debug!(
          "第 {} 周期完成: {} 个姿态, 在场={}",
          self.cycle,
          detection.pose_count(),
          person_present
        );
        self.store.record_cycle(detection, person_present);
        self.tick_scheduled = true;
        TickOutcome::Rendered
      }
    }
  }
}
