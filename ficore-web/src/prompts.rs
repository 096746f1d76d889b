//! Once-per-context education prompts
//!
//! Each user sees the prompt for a context at most once per process
//! lifetime, and then only on a 30% roll.

use std::collections::HashSet;
use std::sync::Mutex;

use ficore_common::education::{
    education_prompt, roll_education_prompt, should_show_education_prompt, EducationPrompt,
    PromptContext,
};

#[derive(Debug, Default)]
pub struct PromptTracker {
    shown: Mutex<HashSet<(String, PromptContext)>>,
}

impl PromptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roll for the user's prompt in `context`
    pub fn prompt_for(&self, user_id: &str, context: PromptContext) -> Option<EducationPrompt> {
        self.prompt_when(user_id, context, roll_education_prompt)
    }

    /// Same as [`Self::prompt_for`] with a fixed roll in `[0, 1)`
    pub fn prompt_with_roll(
        &self,
        user_id: &str,
        context: PromptContext,
        roll: f64,
    ) -> Option<EducationPrompt> {
        self.prompt_when(user_id, context, |shown| {
            should_show_education_prompt(shown, roll)
        })
    }

    fn prompt_when(
        &self,
        user_id: &str,
        context: PromptContext,
        decide: impl FnOnce(bool) -> bool,
    ) -> Option<EducationPrompt> {
        let mut shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        let key = (user_id.to_string(), context);

        if !decide(shown.contains(&key)) {
            return None;
        }

        shown.insert(key);
        Some(education_prompt(context))
    }
}
