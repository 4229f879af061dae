//! The cooperative consumption loop over the transport's inbound queue.

use core::fmt;

use feedline_core::codec::{self, read_fields};
use feedline_core::Inbox;
use feedline_types::FeedlineError;

use crate::core::Client;
use crate::retry::shutdown_requested;
use crate::session::Session;

/// Lifecycle of one session's consumption loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Connected, waiting for the first valid id.
    Connecting,
    /// Seeded and dispatching replies.
    Running,
    /// Leaving the loop; the transport is about to be released.
    Draining,
    /// Transport released.
    Closed,
}

/// Events that move the loop between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// The gateway sent its first valid id.
    Seeded,
    /// A fatal frame, a lost connection or a shutdown request.
    Stop,
    /// The transport was released.
    Released,
}

impl LoopState {
    /// State after `event`; events that do not apply leave the state unchanged.
    #[must_use]
    pub const fn on(self, event: LoopEvent) -> Self {
        match (self, event) {
            (Self::Connecting, LoopEvent::Seeded) => Self::Running,
            (Self::Connecting | Self::Running, LoopEvent::Stop) => Self::Draining,
            (Self::Connecting | Self::Running | Self::Draining, LoopEvent::Released) => {
                Self::Closed
            }
            (state, _) => state,
        }
    }
}

/// Why the consumption loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// Shutdown was requested by the operator or the application.
    Interrupted,
    /// The inbound queue closed or a send failed.
    ConnectionLost,
    /// An inbound frame was oversized or undecodable.
    ProtocolViolation(FeedlineError),
}

impl LoopExit {
    /// Whether the loop ended because shutdown was requested.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

impl fmt::Display for LoopExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => f.write_str("interrupted"),
            Self::ConnectionLost => f.write_str("connection lost"),
            Self::ProtocolViolation(e) => write!(f, "protocol violation: {e}"),
        }
    }
}

impl Client {
    /// Open a new session on the transport.
    ///
    /// Starts a fresh [`Session`] in `Connecting` and drops the id seed; the
    /// registry and the id high-water mark carry over from earlier sessions.
    /// Streams the previous session left unfinished are queued for replay.
    ///
    /// # Errors
    /// Propagates the transport's connect error.
    pub async fn connect(&mut self) -> Result<Inbox, FeedlineError> {
        let inbox = self.transport.connect(&self.params).await?;
        self.generation += 1;
        self.ids.reset();
        self.session = Some(Session::new(self.generation));
        self.ctx.log.info(&format!(
            "connected to {}:{} as client {} (session {})",
            self.params.host, self.params.port, self.params.client_id, self.generation
        ));
        let interrupted = self.registry.restart_streams();
        if interrupted > 0 {
            self.ctx.log.info(&format!(
                "{interrupted} interrupted stream(s) queued for replay"
            ));
        }
        Ok(inbox)
    }

    /// Connect and drive one session to its end.
    ///
    /// # Errors
    /// Returns the connect error; once connected the outcome is a [`LoopExit`].
    pub async fn run(&mut self) -> Result<LoopExit, FeedlineError> {
        let inbox = self.connect().await?;
        Ok(self.drive(inbox).await)
    }

    /// Consume `inbox` until shutdown, connection loss or a protocol
    /// violation, then release the transport.
    ///
    /// The transport is disconnected exactly once, whatever the exit path.
    pub async fn drive(&mut self, mut inbox: Inbox) -> LoopExit {
        let exit = self.consume(&mut inbox).await;
        drop(inbox);
        self.close(&exit).await;
        exit
    }

    /// Release the transport if a session is open. Closing twice is a no-op.
    pub async fn disconnect(&mut self) {
        self.close(&LoopExit::Interrupted).await;
    }

    async fn consume(&mut self, inbox: &mut Inbox) -> LoopExit {
        let mut shutdown = self.ctx.shutdown.clone();
        loop {
            if *shutdown.borrow() {
                return LoopExit::Interrupted;
            }
            let polled = tokio::select! {
                biased;
                true = shutdown_requested(&mut shutdown) => return LoopExit::Interrupted,
                polled = tokio::time::timeout(self.cfg.poll_interval, inbox.recv()) => polled,
            };

            let outcome = match polled {
                Ok(Some(frame)) => self.on_frame(&frame).await,
                Ok(None) => {
                    self.ctx.log.error("inbound queue closed; connection lost");
                    return LoopExit::ConnectionLost;
                }
                Err(_) => self.on_idle().await,
            };

            match outcome {
                Ok(()) => {}
                Err(e) if e.is_protocol_violation() => {
                    self.ctx.log.error(&format!("dropping session: {e}"));
                    return LoopExit::ProtocolViolation(e);
                }
                Err(e) if e.is_fatal() => {
                    self.ctx.log.error(&format!("dropping session: {e}"));
                    return LoopExit::ConnectionLost;
                }
                Err(e) => self.ctx.log.error(&e.to_string()),
            }
        }
    }

    async fn on_frame(&mut self, frame: &[u8]) -> Result<(), FeedlineError> {
        if let Some(session) = self.session.as_mut() {
            session.touch();
        }
        codec::check_frame_len(frame.len(), self.cfg.max_frame_len)?;
        let fields = read_fields(frame)?;
        let messages = self.decoder.interpret(&fields)?;
        for msg in messages {
            self.dispatch(msg).await?;
        }
        Ok(())
    }

    async fn on_idle(&mut self) -> Result<(), FeedlineError> {
        let idle = self.session.as_ref().map(Session::idle_for);
        match idle {
            Some(idle) if idle >= self.cfg.liveness_threshold => {
                self.ctx.log.info(&format!(
                    "no activity for {}s; probing gateway",
                    idle.as_secs()
                ));
                let summary = self.verify().await?;
                if !summary.is_empty() {
                    self.ctx.log.info(&format!("re-issued {summary}"));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn close(&mut self, exit: &LoopExit) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state() == LoopState::Closed {
            return;
        }
        session.set_state(session.state().on(LoopEvent::Stop));
        self.transport.disconnect().await;
        session.set_state(session.state().on(LoopEvent::Released));

        #[cfg(feature = "tracing")]
        tracing::info!(
            generation = session.generation(),
            uptime_ms = session.uptime().as_millis(),
            "session closed"
        );
        let generation = session.generation();
        self.ctx
            .log
            .info(&format!("session {generation} closed: {exit}"));
    }
}
