use axum::extract::Multipart;
use serde::Deserialize;
use uuid::Uuid;

use super::{repo_types::RecipeInput, services::RecipeError};
use crate::{error::AppError, uploads::services::UploadItem};

/// Multipart form for create and update. Text fields are kept raw until
/// [`RecipeForm::validate`].
#[derive(Default)]
pub struct RecipeForm {
    pub title: Option<String>,
    pub ingredients: Option<String>,
    pub steps: Option<String>,
    pub image_url: Option<String>,
    pub cooking_time: Option<String>,
    pub servings: Option<String>,
    pub category_id: Option<String>,
    pub image: Option<UploadItem>,
}

impl RecipeForm {
    pub async fn from_multipart(mut mp: Multipart) -> Result<Self, AppError> {
        let mut form = RecipeForm::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "imageFile" {
                let file_name = field.file_name().map(|s| s.to_string());
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                // browsers send an empty part when no file was picked
                if !body.is_empty() {
                    form.image = Some(UploadItem { file_name, body });
                }
                continue;
            }
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            form.set_text(&name, value);
        }
        Ok(form)
    }

    /// Records a text field; unknown names are ignored.
    pub fn set_text(&mut self, name: &str, value: String) {
        let slot = match name {
            "title" => &mut self.title,
            "ingredients" => &mut self.ingredients,
            "steps" => &mut self.steps,
            "imageUrl" => &mut self.image_url,
            "cookingTime" => &mut self.cooking_time,
            "servings" => &mut self.servings,
            "categoryId" => &mut self.category_id,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Checks the text fields. The image part is left in place for the caller.
    pub fn validate(&self) -> Result<RecipeInput, RecipeError> {
        Ok(RecipeInput {
            title: required(&self.title, "Title")?,
            ingredients: required(&self.ingredients, "Ingredients")?,
            steps: required(&self.steps, "Steps")?,
            image_url: non_blank(&self.image_url),
            cooking_time: positive(&self.cooking_time, "cookingTime")?,
            servings: positive(&self.servings, "servings")?,
            category_id: non_blank(&self.category_id)
                .ok_or_else(|| RecipeError::Validation("Category is required".into()))?
                .parse::<Uuid>()
                .map_err(|_| RecipeError::Validation("categoryId must be a valid id".into()))?,
        })
    }
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn required(v: &Option<String>, label: &str) -> Result<String, RecipeError> {
    non_blank(v).ok_or_else(|| RecipeError::Validation(format!("{label} is required")))
}

fn positive(v: &Option<String>, label: &str) -> Result<Option<i32>, RecipeError> {
    match non_blank(v) {
        None => Ok(None),
        Some(raw) => match raw.parse::<i32>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(RecipeError::Validation(format!(
                "{label} must be a positive whole number"
            ))),
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RecipeForm {
        let mut form = RecipeForm::default();
        form.set_text("title", " Pancakes ".into());
        form.set_text("ingredients", "flour, milk, eggs".into());
        form.set_text("steps", "mix; fry".into());
        form.set_text("categoryId", Uuid::nil().to_string());
        form
    }

    #[test]
    fn minimal_form_validates() {
        let input = filled().validate().unwrap();
        assert_eq!(input.title, "Pancakes");
        assert_eq!(input.category_id, Uuid::nil());
        assert_eq!(input.cooking_time, None);
        assert_eq!(input.servings, None);
        assert_eq!(input.image_url, None);
    }

    #[test]
    fn optional_numbers_are_parsed() {
        let mut form = filled();
        form.set_text("cookingTime", "25".into());
        form.set_text("servings", "".into());
        form.set_text("imageUrl", "/images/a.png".into());
        let input = form.validate().unwrap();
        assert_eq!(input.cooking_time, Some(25));
        assert_eq!(input.servings, None);
        assert_eq!(input.image_url.as_deref(), Some("/images/a.png"));
    }

    #[test]
    fn missing_required_fields_fail() {
        let mut form = filled();
        form.set_text("title", "   ".into());
        assert!(matches!(form.validate(), Err(RecipeError::Validation(m)) if m.contains("Title")));

        let mut form = filled();
        form.category_id = None;
        assert!(matches!(form.validate(), Err(RecipeError::Validation(m)) if m.contains("Category")));
    }

    #[test]
    fn bad_numbers_and_ids_fail() {
        let mut form = filled();
        form.set_text("cookingTime", "-5".into());
        assert!(form.validate().is_err());

        let mut form = filled();
        form.set_text("servings", "two".into());
        assert!(form.validate().is_err());

        let mut form = filled();
        form.set_text("categoryId", "3".into());
        assert!(form.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut form = filled();
        form.set_text("userId", Uuid::new_v4().to_string());
        assert!(form.validate().is_ok());
    }
}
