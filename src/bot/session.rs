//! Per-user conversation state. Multi-turn flows (code submission,
//! interview answers, admin authoring forms, destructive confirmations)
//! carry an explicit typed state through this map instead of leaning on
//! dispatcher globals.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::models::Difficulty;

#[derive(Debug, Clone)]
pub enum SessionState {
    /// `submit` was issued; the next message is the code.
    AwaitingCode { challenge_id: Option<i64> },
    /// An interview question is on the table; the next message is the
    /// candidate's answer.
    AwaitingAnswer { question_id: i64 },
    /// Mid-flight challenge authoring form (admin).
    ChallengeForm(ChallengeDraft),
    /// Mid-flight interview-question authoring form (admin).
    QuestionForm(QuestionDraft),
    /// A destructive action parked until an explicit `confirm`.
    AwaitingConfirm(PendingAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStep {
    Title,
    Description,
    Difficulty,
    Language,
    TestCases,
    Solution,
    Points,
}

#[derive(Debug, Clone)]
pub struct ChallengeDraft {
    pub step: ChallengeStep,
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub language: Option<String>,
    pub test_cases: Option<String>,
    pub solution: Option<String>,
}

impl ChallengeDraft {
    pub fn new() -> Self {
        Self {
            step: ChallengeStep::Title,
            title: None,
            description: None,
            difficulty: None,
            language: None,
            test_cases: None,
            solution: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStep {
    Category,
    Question,
    Answer,
    Difficulty,
}

#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub step: QuestionStep,
    pub category: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl QuestionDraft {
    pub fn new() -> Self {
        Self {
            step: QuestionStep::Category,
            category: None,
            question: None,
            answer: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PendingAction {
    DeleteUser(i64),
    DeleteChallenge(i64),
    DeleteQuestion(i64),
    Broadcast(String),
}

/// One conversation state per user.
#[derive(Default)]
pub struct Sessions {
    states: Mutex<HashMap<u64, SessionState>>,
}

impl Sessions {
    pub async fn set(&self, user_id: u64, state: SessionState) {
        self.states.lock().await.insert(user_id, state);
    }

    /// Removes and returns the user's state; flows that continue re-insert.
    pub async fn take(&self, user_id: u64) -> Option<SessionState> {
        self.states.lock().await.remove(&user_id)
    }

    pub async fn clear(&self, user_id: u64) -> bool {
        self.states.lock().await.remove(&user_id).is_some()
    }

    pub async fn is_active(&self, user_id: u64) -> bool {
        self.states.lock().await.contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn take_consumes_the_state() {
        let sessions = Sessions::default();
        sessions
            .set(1, SessionState::AwaitingCode { challenge_id: Some(3) })
            .await;

        assert!(sessions.is_active(1).await);
        assert!(matches!(
            sessions.take(1).await,
            Some(SessionState::AwaitingCode { challenge_id: Some(3) })
        ));
        assert!(sessions.take(1).await.is_none());
    }

    #[tokio::test]
    async fn states_are_per_user() {
        let sessions = Sessions::default();
        sessions.set(1, SessionState::AwaitingAnswer { question_id: 9 }).await;

        assert!(!sessions.is_active(2).await);
        assert!(sessions.clear(1).await);
        assert!(!sessions.clear(1).await);
    }
}
