use super::{FieldErrors, Submission, REQUIRED};
use crate::auth::password_problems;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::Validate;

pub const USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";
pub const PASSWORD_MISMATCH: &str = "Введенные пароли не совпадают.";
pub const BAD_CREDENTIALS: &str = "Пожалуйста, введите правильные имя пользователя и пароль. Оба поля могут быть чувствительны к регистру.";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));

#[derive(Debug, Clone, Default, Validate)]
pub struct SignupInput {
    #[validate(length(max = 150, message = "Убедитесь, что это значение содержит не более 150 символов."))]
    pub first_name: String,
    #[validate(length(max = 150, message = "Убедитесь, что это значение содержит не более 150 символов."))]
    pub last_name: String,
    #[validate(
        length(max = 150, message = "Убедитесь, что это значение содержит не более 150 символов."),
        regex(
            path = *USERNAME_RE,
            message = "Введите правильное имя пользователя. Оно может содержать только буквы, цифры и знаки @/./+/-/_."
        )
    )]
    pub username: String,
    #[validate(email(message = "Введите правильный адрес электронной почты."))]
    pub email: Option<String>,
    pub password1: String,
    pub password2: String,
}

impl SignupInput {
    pub fn from_submission(submission: &Submission) -> Self {
        let email = submission.value("email").trim().to_string();
        Self {
            first_name: submission.value("first_name").trim().to_string(),
            last_name: submission.value("last_name").trim().to_string(),
            username: submission.value("username").trim().to_string(),
            email: (!email.is_empty()).then_some(email),
            password1: submission.value("password1"),
            password2: submission.value("password2"),
        }
    }
}

/// Signup form state for the template
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub errors: FieldErrors,
    pub non_field_errors: Vec<String>,
}

/// One rendered input of the signup page
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub required: bool,
    pub value: String,
    pub errors: Vec<String>,
}

impl SignupForm {
    /// Validate everything that does not need storage.
    ///
    /// Username uniqueness is checked by the caller when the user is created.
    pub fn validate(submission: &Submission) -> Result<SignupInput, SignupForm> {
        let input = SignupInput::from_submission(submission);
        let mut form = SignupForm {
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            username: input.username.clone(),
            email: input.email.clone().unwrap_or_default(),
            ..SignupForm::default()
        };

        if let Err(errors) = input.validate() {
            form.errors = FieldErrors::from(&errors);
        }

        for (field, value) in [
            ("username", &input.username),
            ("password1", &input.password1),
            ("password2", &input.password2),
        ] {
            if value.is_empty() {
                form.errors.replace(field, REQUIRED);
            }
        }

        if !input.password1.is_empty() && !input.password2.is_empty() {
            if input.password1 != input.password2 {
                form.errors.add("password2", PASSWORD_MISMATCH);
            } else {
                for problem in password_problems(&input.password2, &input.username) {
                    form.errors.add("password2", problem);
                }
            }
        }

        if form.errors.is_empty() {
            Ok(input)
        } else {
            Err(form)
        }
    }

    pub fn with_username_taken(mut self) -> Self {
        self.errors.add("username", USERNAME_TAKEN);
        self
    }

    pub fn fields(&self) -> Vec<FieldView> {
        let field = |name, label, input_type, required, value: &str| FieldView {
            name,
            label,
            input_type,
            required,
            value: value.to_string(),
            errors: self.errors.get(name).to_vec(),
        };

        vec![
            field("first_name", "Имя", "text", false, &self.first_name),
            field("last_name", "Фамилия", "text", false, &self.last_name),
            field("username", "Имя пользователя", "text", true, &self.username),
            field("email", "Адрес электронной почты", "email", false, &self.email),
            field("password1", "Пароль", "password", true, ""),
            field("password2", "Подтверждение пароля", "password", true, ""),
        ]
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Обязательное поле."))]
    pub username: String,
    #[validate(length(min = 1, message = "Обязательное поле."))]
    pub password: String,
}

/// Login form state for the template
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub errors: FieldErrors,
    pub non_field_errors: Vec<String>,
}

impl LoginForm {
    pub fn validate(submission: &Submission) -> Result<LoginInput, LoginForm> {
        let input = LoginInput {
            username: submission.value("username").trim().to_string(),
            password: submission.value("password"),
        };

        match input.validate() {
            Ok(()) => Ok(input),
            Err(errors) => Err(LoginForm {
                username: input.username,
                errors: FieldErrors::from(&errors),
                non_field_errors: Vec::new(),
            }),
        }
    }

    pub fn rejected(username: &str) -> Self {
        Self {
            username: username.to_string(),
            errors: FieldErrors::default(),
            non_field_errors: vec![BAD_CREDENTIALS.to_string()],
        }
    }
}
