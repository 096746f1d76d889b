//! Read-only reference content: expense categories, education and tax bands

use axum::{
    extract::{Path, Query},
    Json,
};
use ficore_common::categories::{self, ExpenseCategory, EXPENSE_CATEGORIES};
use ficore_common::education::{
    self, learning_path, next_recommended_module, user_type_recommendation, BusinessDetails,
    EducationPrompt, UserType,
};
use ficore_common::tax::{apply_progressive_tax_bands, TaxBreakdown};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
pub struct CategoryChoice {
    pub key: &'static str,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: &'static [ExpenseCategory],
    /// Select-box entries sorted by label
    pub choices: Vec<CategoryChoice>,
    pub tax_deductible: Vec<&'static str>,
}

/// GET /api/expense_categories
pub async fn expense_categories() -> Json<CategoriesResponse> {
    let choices = categories::form_choices()
        .into_iter()
        .map(|(key, label)| CategoryChoice { key, label })
        .collect();

    Json(CategoriesResponse {
        categories: EXPENSE_CATEGORIES,
        choices,
        tax_deductible: categories::tax_deductible_keys(),
    })
}

/// GET /education/prompt/:context
pub async fn education_prompt(Path(context): Path<String>) -> ApiResult<Json<EducationPrompt>> {
    education::education_prompt_for(&context)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown prompt context: {}", context)))
}

/// GET /education/tip
pub async fn education_tip() -> Json<EducationPrompt> {
    Json(education::random_education_tip())
}

#[derive(Debug, Serialize)]
pub struct NextModule {
    pub current_module: String,
    pub next_module: &'static str,
}

/// GET /education/next/:module_id
pub async fn next_module(Path(module_id): Path<String>) -> Json<NextModule> {
    let next_module = next_recommended_module(&module_id);
    Json(NextModule {
        current_module: module_id,
        next_module,
    })
}

#[derive(Debug, Serialize)]
pub struct UserTypeResponse {
    pub user_type: UserType,
    pub learning_path: &'static [&'static str],
}

/// POST /education/user_type
pub async fn user_type(Json(details): Json<BusinessDetails>) -> Json<UserTypeResponse> {
    let user_type = user_type_recommendation(Some(&details));
    Json(UserTypeResponse {
        user_type,
        learning_path: learning_path(user_type),
    })
}

#[derive(Debug, Deserialize)]
pub struct TaxQuery {
    pub taxable_income: f64,
}

/// GET /tax/bands?taxable_income=
pub async fn tax_bands(Query(query): Query<TaxQuery>) -> ApiResult<Json<TaxBreakdown>> {
    if !query.taxable_income.is_finite() {
        return Err(ApiError::BadRequest(
            "taxable_income must be a finite number".to_string(),
        ));
    }
    Ok(Json(apply_progressive_tax_bands(query.taxable_income)))
}
