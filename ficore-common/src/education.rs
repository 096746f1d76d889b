//! Tax-education prompts and learning paths
//!
//! Static content shown next to bookkeeping actions, e.g. a hint about
//! deductible expenses after a payment is logged.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Chance that an eligible prompt is actually shown
pub const PROMPT_PROBABILITY: f64 = 0.3;

/// Module every learning path starts from
pub const DEFAULT_MODULE: &str = "understanding_tax_types";

/// Situations that trigger a contextual prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptContext {
    ExpenseLogged,
    ReceiptAdded,
    AnnualRentUpdated,
    FirstTimeUser,
    TaxSeasonReminder,
}

impl PromptContext {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "expense_logged" => Some(PromptContext::ExpenseLogged),
            "receipt_added" => Some(PromptContext::ReceiptAdded),
            "annual_rent_updated" => Some(PromptContext::AnnualRentUpdated),
            "first_time_user" => Some(PromptContext::FirstTimeUser),
            "tax_season_reminder" => Some(PromptContext::TaxSeasonReminder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptContext::ExpenseLogged => "expense_logged",
            PromptContext::ReceiptAdded => "receipt_added",
            PromptContext::AnnualRentUpdated => "annual_rent_updated",
            PromptContext::FirstTimeUser => "first_time_user",
            PromptContext::TaxSeasonReminder => "tax_season_reminder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationPrompt {
    pub message: &'static str,
    pub link: &'static str,
    pub action_text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
}

pub fn education_prompt(context: PromptContext) -> EducationPrompt {
    match context {
        PromptContext::ExpenseLogged => EducationPrompt {
            message: "Did you know some of these expenses are tax-deductible?",
            link: "/education/module/deductions_reliefs",
            action_text: "Learn About Deductions",
            icon: Some("fas fa-percentage"),
        },
        PromptContext::ReceiptAdded => EducationPrompt {
            message: "Keep digital records for tax compliance!",
            link: "/education/module/tracking_compliance",
            action_text: "Learn About Record Keeping",
            icon: Some("fas fa-clipboard-check"),
        },
        PromptContext::AnnualRentUpdated => EducationPrompt {
            message: "Rent relief can lower your tax! Learn more about available reliefs.",
            link: "/education/module/deductions_reliefs",
            action_text: "Learn About Rent Relief",
            icon: Some("fas fa-home"),
        },
        PromptContext::FirstTimeUser => EducationPrompt {
            message: "New to tax compliance? Start with understanding your tax obligations.",
            link: "/education/",
            action_text: "Start Tax Education",
            icon: Some("fas fa-graduation-cap"),
        },
        PromptContext::TaxSeasonReminder => EducationPrompt {
            message: "Filing season is approaching! Make sure you understand the requirements.",
            link: "/education/module/filing_vs_paying",
            action_text: "Learn Filing Requirements",
            icon: Some("fas fa-calendar-alt"),
        },
    }
}

/// Prompt for a context name, `None` for unknown contexts
pub fn education_prompt_for(context: &str) -> Option<EducationPrompt> {
    PromptContext::parse(context).map(education_prompt)
}

const TIPS: &[EducationPrompt] = &[
    EducationPrompt {
        message: "Properly categorizing expenses helps maximize your tax deductions",
        link: "/education/module/deductions_reliefs",
        action_text: "Learn About Deductions",
        icon: None,
    },
    EducationPrompt {
        message: "TIN registration is free and mandatory for all taxpayers",
        link: "/education/module/next_steps",
        action_text: "Learn About TIN",
        icon: None,
    },
    EducationPrompt {
        message: "Filing tax returns is required even if you owe no tax",
        link: "/education/module/filing_vs_paying",
        action_text: "Learn About Filing",
        icon: None,
    },
    EducationPrompt {
        message: "You can claim rent relief of up to ₦500,000 annually",
        link: "/education/module/deductions_reliefs",
        action_text: "Learn About Reliefs",
        icon: None,
    },
];

pub fn all_tips() -> &'static [EducationPrompt] {
    TIPS
}

pub fn random_education_tip() -> EducationPrompt {
    TIPS.choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| TIPS[0].clone())
}

/// Decide whether to show a prompt
///
/// A prompt is shown at most once per context; `roll` is a uniform draw in
/// `[0, 1)`.
pub fn should_show_education_prompt(already_shown: bool, roll: f64) -> bool {
    !already_shown && roll < PROMPT_PROBABILITY
}

/// [`should_show_education_prompt`] with a fresh random roll
pub fn roll_education_prompt(already_shown: bool) -> bool {
    should_show_education_prompt(already_shown, rand::thread_rng().gen::<f64>())
}

/// Business details a user has filled in, if any
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessDetails {
    pub name: Option<String>,
    pub registration_type: Option<String>,
}

impl BusinessDetails {
    /// No detail was given at all; a present but blank value still counts
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.registration_type.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Employee,
    EntrepreneurUnregistered,
    SoleProprietor,
    Company,
}

pub fn user_type_recommendation(details: Option<&BusinessDetails>) -> UserType {
    let details = match details {
        Some(d) if !d.is_empty() => d,
        _ => return UserType::Employee,
    };

    if details
        .registration_type
        .as_deref()
        .map_or(true, str::is_empty)
    {
        return UserType::EntrepreneurUnregistered;
    }

    let name = details.name.as_deref().unwrap_or_default().to_lowercase();
    if name.contains("limited") || name.contains("ltd") {
        return UserType::Company;
    }

    UserType::SoleProprietor
}

pub fn learning_path(user_type: UserType) -> &'static [&'static str] {
    match user_type {
        UserType::Employee => &[
            "understanding_tax_types",
            "paye_basics",
            "deductions_reliefs",
            "next_steps",
        ],
        UserType::EntrepreneurUnregistered => &[
            "understanding_tax_types",
            "formalization_benefits",
            "presumptive_tax",
            "deductions_reliefs",
            "tracking_compliance",
            "next_steps",
        ],
        UserType::SoleProprietor => &[
            "understanding_tax_types",
            "pit_requirements",
            "filing_vs_paying",
            "deductions_reliefs",
            "tracking_compliance",
            "next_steps",
        ],
        UserType::Company => &[
            "understanding_tax_types",
            "cit_requirements",
            "filing_vs_paying",
            "deductions_reliefs",
            "tracking_compliance",
            "next_steps",
        ],
    }
}

const GENERAL_PATH: &[&str] = &[
    "understanding_tax_types",
    "deductions_reliefs",
    "filing_vs_paying",
    "next_steps",
];

/// Next module on the general path; restarts at the beginning after the
/// last module or for an unknown one
pub fn next_recommended_module(current_module: &str) -> &'static str {
    GENERAL_PATH
        .iter()
        .position(|m| *m == current_module)
        .and_then(|i| GENERAL_PATH.get(i + 1))
        .copied()
        .unwrap_or(DEFAULT_MODULE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lookup() {
        let prompt = education_prompt_for("expense_logged").unwrap();
        assert_eq!(prompt.action_text, "Learn About Deductions");
        assert!(education_prompt_for("lottery_won").is_none());
    }

    #[test]
    fn test_every_context_round_trips() {
        for context in [
            PromptContext::ExpenseLogged,
            PromptContext::ReceiptAdded,
            PromptContext::AnnualRentUpdated,
            PromptContext::FirstTimeUser,
            PromptContext::TaxSeasonReminder,
        ] {
            assert_eq!(PromptContext::parse(context.as_str()), Some(context));
            assert!(!education_prompt(context).message.is_empty());
        }
    }

    #[test]
    fn test_random_tip_is_from_catalogue() {
        let tip = random_education_tip();
        assert!(all_tips().contains(&tip));
    }

    #[test]
    fn test_prompt_gate() {
        assert!(should_show_education_prompt(false, 0.1));
        assert!(!should_show_education_prompt(false, 0.3));
        assert!(!should_show_education_prompt(true, 0.0));
        assert!(!roll_education_prompt(true));
    }

    #[test]
    fn test_user_type_recommendation() {
        assert_eq!(user_type_recommendation(None), UserType::Employee);
        assert_eq!(
            user_type_recommendation(Some(&BusinessDetails::default())),
            UserType::Employee
        );

        let unregistered = BusinessDetails {
            name: Some("Iya Basira Foods".into()),
            registration_type: None,
        };
        assert_eq!(
            user_type_recommendation(Some(&unregistered)),
            UserType::EntrepreneurUnregistered
        );

        let company = BusinessDetails {
            name: Some("Okafor Trading LTD".into()),
            registration_type: Some("cac".into()),
        };
        assert_eq!(user_type_recommendation(Some(&company)), UserType::Company);

        let sole = BusinessDetails {
            name: Some("Okafor Trading".into()),
            registration_type: Some("business_name".into()),
        };
        assert_eq!(user_type_recommendation(Some(&sole)), UserType::SoleProprietor);
    }

    #[test]
    fn test_blank_details_are_still_details() {
        let blank = BusinessDetails {
            name: Some(String::new()),
            registration_type: Some(String::new()),
        };
        assert_eq!(
            user_type_recommendation(Some(&blank)),
            UserType::EntrepreneurUnregistered
        );
    }

    #[test]
    fn test_next_module() {
        assert_eq!(next_recommended_module("understanding_tax_types"), "deductions_reliefs");
        assert_eq!(next_recommended_module("filing_vs_paying"), "next_steps");
        assert_eq!(next_recommended_module("next_steps"), DEFAULT_MODULE);
        assert_eq!(next_recommended_module("unknown"), DEFAULT_MODULE);
    }

    #[test]
    fn test_learning_paths_start_with_basics() {
        for user_type in [
            UserType::Employee,
            UserType::EntrepreneurUnregistered,
            UserType::SoleProprietor,
            UserType::Company,
        ] {
            assert_eq!(learning_path(user_type)[0], DEFAULT_MODULE);
        }
    }
}
