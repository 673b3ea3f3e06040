//! The conversation: four rounds of template answers.
//!
//! Every state is a variant of [`IdealState`]. Picking any option of a round
//! switches the user to the next round; Round4 wraps around to Round1.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use bottex::framework::{CommandCache, HandlerResult};
use bottex::prelude::*;

const FALLBACK: &str = "I can only understand template answers";

static COMMANDS: LazyLock<CommandCache<IdealState>> = LazyLock::new(CommandCache::new);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdealState {
    Round1,
    Round2,
    Round3,
    Round4,
    Success,
}

impl IdealState {
    pub const ALL: [IdealState; 5] = [
        IdealState::Round1,
        IdealState::Round2,
        IdealState::Round3,
        IdealState::Round4,
        IdealState::Success,
    ];

    /// Where any option of this state leads.
    fn next(self) -> IdealState {
        match self {
            IdealState::Round1 => IdealState::Round2,
            IdealState::Round2 => IdealState::Round3,
            IdealState::Round3 => IdealState::Round4,
            IdealState::Round4 | IdealState::Success => IdealState::Round1,
        }
    }

    fn labels(self) -> &'static [&'static str] {
        match self {
            IdealState::Round1 => &[
                "Go to a bar",
                "Go to a restaurant",
                "Go to the cinema",
                "Take a walk",
                "Stay home and watch a movie",
                "Lie in bed",
                "Drive around the city",
            ],
            IdealState::Round2 => &["Movie", "Series", "Cartoon", "Documentary about killers"],
            IdealState::Round3 => &[
                "Black Mirror",
                "Stranger Things",
                "How I Met Your Mother",
                "Riverdale",
            ],
            IdealState::Round4 => &[
                "McDonald's",
                "KFC",
                "Burger King",
                "Carl's Jr.",
                "Pizza Hut",
                "Other",
            ],
            IdealState::Success => &["Start over"],
        }
    }

    fn build_commands(self) -> CommandList {
        let next = self.next();
        let mut list = CommandList::new();
        for label in self.labels() {
            list.add(*label, move |request: Request| async move { next.switch(&request).await });
        }
        list
    }
}

#[async_trait]
impl View for IdealState {
    fn name(&self) -> &'static str {
        match self {
            IdealState::Round1 => "Round1",
            IdealState::Round2 => "Round2",
            IdealState::Round3 => "Round3",
            IdealState::Round4 => "Round4",
            IdealState::Success => "Success",
        }
    }

    fn commands(&self) -> Arc<CommandList> {
        COMMANDS.get_or_init(self, || self.build_commands())
    }

    fn prompt(&self, commands: &CommandList) -> Option<String> {
        let choices = commands.enumerate();
        Some(match self {
            IdealState::Round1 => format!("So, choose what you want to do today:\n{choices}"),
            IdealState::Round2 => format!("Ok, round 2.\n\nChoose what you want to watch:\n\n{choices}"),
            IdealState::Round3 => format!(
                "Round 3\n\nPick a series:\n\n{choices}\n\n\
                 (If you want something we have already watched, just write it)"
            ),
            IdealState::Round4 => format!("Alright, the final\nChoose where I should buy food:\n{choices}"),
            IdealState::Success => "Got it. Arriving in 40 minutes".to_string(),
        })
    }

    async fn default(&self, request: &Request) -> HandlerResult {
        match self {
            IdealState::Success => IdealState::Round1.switch(request).await,
            _ => Ok(request.reply_with(FALLBACK, &self.keyboard()).await),
        }
    }
}

/// The root handler: route by persisted state, start new users at Round1.
pub fn main_router() -> Router {
    let views = IdealState::ALL.map(|state| Arc::new(state) as Arc<dyn View>);
    Router::from_routes(gen_state_cases(views), |request: Request| async move {
        IdealState::Round1.switch(&request).await
    })
    .name("ideal_man")
}
