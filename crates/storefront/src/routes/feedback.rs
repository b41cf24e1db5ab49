//! Feedback dialog shown after every user action that can fail.
//!
//! The fragment targets `#feedback` out-of-band, so it can ride along with
//! any other HTMX response.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::{AppendHeaders, IntoResponse, Response};

/// User-facing messages.
pub mod messages {
    pub const LOGIN_REQUIRED_FOR_CART: &str = "Você precisa estar logado para adicionar ao carrinho";
    pub const LOGIN_REQUIRED_FOR_ORDER: &str = "Você precisa estar logado para confirmar o pedido.";
    pub const ADDED_TO_CART: &str = "Produto adicionado ao carrinho";
    pub const ADD_TO_CART_FAILED: &str = "Erro ao adicionar ao carrinho";
    pub const REMOVED_FROM_CART: &str = "Produto removido do carrinho";
    pub const REMOVE_FROM_CART_FAILED: &str = "Erro ao remover do carrinho";
    pub const QUANTITY_FAILED: &str = "Erro ao modificar quantidade";
    pub const CART_LOAD_FAILED: &str = "Não foi possível carregar o carrinho.";
    pub const CART_EMPTY: &str = "Seu carrinho está vazio.";
    pub const PRODUCT_NOT_FOUND: &str = "Produto não encontrado";
    pub const CATEGORIES_FAILED: &str = "Erro ao carregar categorias";
    pub const PRODUCTS_FAILED: &str = "Erro ao carregar produtos";
    pub const ORDER_CONFIRMED: &str = "Pedido confirmado com sucesso!";
    pub const ORDER_FAILED: &str = "Falha ao confirmar o pedido.";
    pub const ORDERS_FAILED: &str = "Não foi possível carregar seus pedidos.";
    pub const BAD_CREDENTIALS: &str = "Email ou senha incorretos.";
    pub const SIGN_UP_FAILED: &str = "Erro ao criar conta";
    pub const SIGN_UP_DONE: &str =
        "Conta criada com sucesso! Verifique seu e-mail para ativar a conta.";
    pub const SESSION_FAILED: &str = "Não foi possível iniciar a sessão. Tente novamente.";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Error,
    Success,
    Info,
}

impl FeedbackKind {
    /// CSS modifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Success => "success",
            Self::Info => "info",
        }
    }

    /// Dialog heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Error => "Erro",
            Self::Success => "Sucesso",
            Self::Info => "Aviso",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: &'static str,
}

impl Feedback {
    #[must_use]
    pub const fn error(message: &'static str) -> Self {
        Self {
            kind: FeedbackKind::Error,
            message,
        }
    }

    #[must_use]
    pub const fn success(message: &'static str) -> Self {
        Self {
            kind: FeedbackKind::Success,
            message,
        }
    }

    #[must_use]
    pub const fn info(message: &'static str) -> Self {
        Self {
            kind: FeedbackKind::Info,
            message,
        }
    }

    /// Respond with only this dialog, leaving the request's target untouched.
    #[must_use]
    pub fn alone(self) -> Response {
        (
            AppendHeaders([("HX-Reswap", "none")]),
            FeedbackFragment { feedback: self },
        )
            .into_response()
    }
}

/// The feedback dialog on its own.
#[derive(Template, WebTemplate)]
#[template(path = "partials/feedback_fragment.html")]
pub struct FeedbackFragment {
    pub feedback: Feedback,
}
