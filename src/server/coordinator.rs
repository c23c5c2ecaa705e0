//! Session coordinator.
//!
//! Owns the active question, the poll tally, the countdown and the
//! connection registry. Events are handled one at a time by the event loop,
//! and each handler finishes its broadcasts before returning.

use tracing::{debug, info};

use crate::error::Rejection;
use crate::models::{Question, QuestionPayload};
use crate::protocol::{
    ClientMessage, LeaderboardEntry, ServerMessage, TallySnapshot, CORRECT_ANSWER_POINTS,
    QUESTION_DURATION_SECS,
};

use super::gateway::{Gateway, Outbound};
use super::registry::{ConnectionId, ConnectionRegistry};
use super::tally::PollTally;
use super::timer::{QuestionTimer, TickOutcome, TickScheduler, TimerState};

/// Everything the event loop can be asked to process.
#[derive(Debug)]
pub enum Event {
    /// A transport connection opened.
    Connected { id: ConnectionId, sender: Outbound },
    /// A parsed message arrived on a connection.
    Message { id: ConnectionId, msg: ClientMessage },
    /// A transport connection closed.
    Disconnected { id: ConnectionId },
    /// One second of the countdown identified by `generation` elapsed.
    Tick { generation: u64 },
}

pub struct Coordinator<S> {
    registry: ConnectionRegistry,
    gateway: Gateway,
    tally: PollTally,
    question: Option<Question>,
    timer: QuestionTimer<S>,
}

impl<S: TickScheduler> Coordinator<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            gateway: Gateway::new(),
            tally: PollTally::new(),
            question: None,
            timer: QuestionTimer::new(scheduler),
        }
    }

    /// Dispatch a single event.
    pub fn handle(&mut self, event: Event) -> Result<(), Rejection> {
        match event {
            Event::Connected { id, sender } => {
                self.connect(id, sender);
                Ok(())
            }
            Event::Message { id, msg } => match msg {
                ClientMessage::SendQuestion(payload) => self.submit_question(id, payload),
                ClientMessage::Join(name) => {
                    self.student_join(id, name);
                    Ok(())
                }
                ClientMessage::Answer(answer) => self.student_answer(id, &answer),
            },
            Event::Disconnected { id } => {
                self.disconnect(id);
                Ok(())
            }
            Event::Tick { generation } => {
                self.tick(generation);
                Ok(())
            }
        }
    }

    pub fn connect(&mut self, id: ConnectionId, sender: Outbound) {
        info!(connection = %id, "New client connected");
        self.registry.connect(id);
        self.gateway.attach(id, sender);
    }

    /// Make `payload` the active question and restart the countdown.
    pub fn submit_question(
        &mut self,
        from: ConnectionId,
        payload: QuestionPayload,
    ) -> Result<(), Rejection> {
        let question = Question::try_from(payload)?;
        info!(
            connection = %from,
            prompt = %question.prompt,
            options = question.options.len(),
            "Question received"
        );

        self.tally.reset(&question);
        self.gateway.broadcast(ServerMessage::NewQuestion {
            question: question.view(),
            time: QUESTION_DURATION_SECS,
        });
        self.gateway
            .send_to(from, ServerMessage::PollUpdate(self.tally.snapshot()));
        self.question = Some(question);

        let initial = self.timer.start();
        self.gateway.broadcast(ServerMessage::TimerUpdate(initial));
        Ok(())
    }

    /// Register the caller as a student and publish the leaderboard.
    pub fn student_join(&mut self, id: ConnectionId, name: String) {
        info!(connection = %id, name = %name, "Student joined");
        self.registry.join(id, name);
        self.broadcast_leaderboard();
    }

    /// Count a vote and award points for a correct answer.
    pub fn student_answer(&mut self, id: ConnectionId, answer: &str) -> Result<(), Rejection> {
        let question = self.question.as_ref().ok_or(Rejection::NoActiveQuestion)?;
        let option = question
            .resolve(answer)
            .ok_or_else(|| Rejection::UnknownOption(answer.to_string()))?;

        if question.is_correct(option) {
            if let Some(score) = self.registry.award(id, CORRECT_ANSWER_POINTS) {
                info!(connection = %id, score, "Correct answer");
            }
        }

        let counted = self.tally.record(option);
        debug_assert!(counted, "resolved option missing from tally");
        debug!(connection = %id, answer, "Answer counted");

        self.gateway
            .broadcast(ServerMessage::PollUpdate(self.tally.snapshot()));
        self.broadcast_leaderboard();
        Ok(())
    }

    /// Forget the connection and publish the leaderboard to everyone left.
    pub fn disconnect(&mut self, id: ConnectionId) {
        if self.registry.remove(id).is_some() {
            info!(connection = %id, "Client disconnected");
        }
        self.gateway.detach(id);
        self.broadcast_leaderboard();
    }

    /// Advance the countdown.
    pub fn tick(&mut self, generation: u64) {
        match self.timer.tick(generation) {
            TickOutcome::Stale => {
                debug!(generation, "Dropped stale tick");
            }
            TickOutcome::Remaining(left) => {
                self.gateway.broadcast(ServerMessage::TimerUpdate(left));
            }
            TickOutcome::Expired => {
                self.gateway.broadcast(ServerMessage::TimerUpdate(0));
                self.gateway.broadcast(ServerMessage::TimeUp);
                self.gateway
                    .broadcast(ServerMessage::QuestionEnded(self.tally.snapshot()));
                self.question = None;
                info!("Question ended");
            }
        }
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.registry.leaderboard()
    }

    pub fn tally(&self) -> TallySnapshot {
        self.tally.snapshot()
    }

    pub fn active_question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn timer_generation(&self) -> u64 {
        self.timer.generation()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &S {
        self.timer.scheduler()
    }

    fn broadcast_leaderboard(&self) {
        let board = self.registry.leaderboard();
        debug!(students = board.len(), "Broadcasting leaderboard");
        self.gateway.broadcast(ServerMessage::Leaderboard(board));
    }
}
