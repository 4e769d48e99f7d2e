//! The chairperson: scripted announcements between turns.

use crate::providers::Announcer;
use crate::role::Role;

use std::sync::Arc;
use tracing::warn;

/// Wraps the announcer collaborator with the chair's scripts. Announcement
/// failures are logged and swallowed; a silent chair never stops a debate.
pub struct Chair {
    announcer: Arc<dyn Announcer>,
    tone: String,
}

impl Chair {
    pub fn new(announcer: Arc<dyn Announcer>, tone: impl Into<String>) -> Self {
        Self {
            announcer,
            tone: tone.into(),
        }
    }

    pub async fn announce_motion(&self, motion: &str) {
        let text = format!(
            "Ladies and gentlemen, welcome to this debate. The motion reads: {motion}, \
             now you have 1 minute to read the motion and then you will have 15 minutes \
             for prep time."
        );
        self.say(&text).await;
    }

    pub async fn start_debate(&self) {
        self.say(
            "Ladies and gentlemen, the prep time is over. Now let's welcome the \
             Prime Minister to deliver his speech, hear hear.",
        )
        .await;
    }

    pub async fn announce_next_speaker(&self, current: Role, next: Role) {
        let text = format!(
            "Thank you {current} for that very fine speech, now let's welcome {next} \
             to deliver his speech, hear hear."
        );
        self.say(&text).await;
    }

    pub async fn announce_end(&self) {
        self.say("Thank you all for your speeches, please wait for the results.")
            .await;
    }

    /// Reads a delivered speech aloud.
    pub async fn read_speech(&self, text: &str) {
        self.say(text).await;
    }

    async fn say(&self, text: &str) {
        if let Err(e) = self.announcer.speak(&self.tone, text).await {
            warn!("announcement failed: {e}");
        }
    }
}
