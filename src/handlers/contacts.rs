// handlers/contacts.rs - owner-scoped contact list and CRUD handlers
//
// Every route here sits behind `require_auth`, so a `CurrentUser` extension
// is always present. Store failures are reported through flash messages;
// only a missing (or foreign) contact ends in a 404 page.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info};

use crate::app::AppState;
use crate::database::{models::Contact, ContactStore, DatabaseError};
use crate::error::AppError;
use crate::forms::{ContactForm, FormErrors};
use crate::middleware::{CurrentUser, Flash};
use crate::pagination::{Page, Paginator, CONTACTS_PER_PAGE};
use crate::views::{self, PageContext};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive search term matched against name, phone, email and address
    pub q: Option<String>,
    /// 1-based page number; anything unparsable falls back to the first page
    pub page: Option<String>,
}

/// GET / - one page of the user's contacts, optionally filtered by `q`
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Query(params): Query<ListQuery>,
) -> Response {
    let flash = Flash::new(session);
    let query = params.q.unwrap_or_default();

    let page = match load_page(state.contacts.as_ref(), user.id, &query, params.page.as_deref()).await {
        Ok(page) => page,
        Err(e) => {
            error!("Failed to load contacts for user {}: {}", user.id, e);
            flash.error(format!("Error loading contacts: {}", e)).await;
            Page::empty(CONTACTS_PER_PAGE)
        }
    };

    let messages = flash.take().await;
    let ctx = PageContext::new("Contacts", Some(&user), &messages);
    views::contacts::list_page(&ctx, &page, &query).into_response()
}

/// Count first so the requested page can be clamped, then fetch its window.
/// An empty query string means no filter.
async fn load_page(
    store: &dyn ContactStore,
    owner: i64,
    query: &str,
    raw_page: Option<&str>,
) -> Result<Page<Contact>, DatabaseError> {
    let filter = Some(query).filter(|q| !q.is_empty());
    let total = store.count(owner, filter).await?;
    let window = Paginator::new(total, CONTACTS_PER_PAGE).page(raw_page);
    let items = store
        .search(owner, filter, window.limit(), window.offset())
        .await?;
    Ok(Page::new(items, window))
}

/// GET /create/
pub async fn create_form(Extension(user): Extension<CurrentUser>, session: Session) -> Response {
    let flash = Flash::new(session);
    render_form(&flash, &user, FormMode::Create, &ContactForm::default(), &FormErrors::default()).await
}

/// POST /create/ - validate, persist with the current user as owner, redirect to the list
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Form(form): Form<ContactForm>,
) -> Response {
    let flash = Flash::new(session);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return render_form(&flash, &user, FormMode::Create, &form, &errors).await,
    };

    match state.contacts.insert(user.id, &input).await {
        Ok(contact) => {
            info!("User {} created contact {}", user.id, contact.id);
            flash.success("Contact created successfully.").await;
            Redirect::to("/").into_response()
        }
        Err(e) => {
            error!("Failed to create contact for user {}: {}", user.id, e);
            flash.error(format!("Failed to create contact: {}", e)).await;
            render_form(&flash, &user, FormMode::Create, &form, &FormErrors::default()).await
        }
    }
}

/// GET /update/{id}/ - form pre-filled with the stored values
pub async fn update_form(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let flash = Flash::new(session);
    let contact = match owned_contact(&state, &user, &id, &flash).await {
        Ok(contact) => contact,
        Err(response) => return response,
    };

    let form = ContactForm::from_contact(&contact);
    render_form(&flash, &user, FormMode::Update(contact.id), &form, &FormErrors::default()).await
}

/// POST /update/{id}/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ContactForm>,
) -> Response {
    let flash = Flash::new(session);
    let contact = match owned_contact(&state, &user, &id, &flash).await {
        Ok(contact) => contact,
        Err(response) => return response,
    };
    let mode = FormMode::Update(contact.id);

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return render_form(&flash, &user, mode, &form, &errors).await,
    };

    match state.contacts.update(user.id, contact.id, &input).await {
        Ok(_) => {
            info!("User {} updated contact {}", user.id, contact.id);
            flash.success("Contact updated successfully.").await;
            Redirect::to("/").into_response()
        }
        Err(DatabaseError::NotFound(msg)) => AppError::not_found(msg).into_response(),
        Err(e) => {
            error!("Failed to update contact {} for user {}: {}", contact.id, user.id, e);
            flash.error(format!("Failed to update contact: {}", e)).await;
            render_form(&flash, &user, mode, &form, &FormErrors::default()).await
        }
    }
}

/// GET /delete/{id}/ - confirmation page
pub async fn delete_confirm(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let flash = Flash::new(session);
    let contact = match owned_contact(&state, &user, &id, &flash).await {
        Ok(contact) => contact,
        Err(response) => return response,
    };

    let messages = flash.take().await;
    let ctx = PageContext::new("Delete contact", Some(&user), &messages);
    views::contacts::confirm_delete_page(&ctx, &contact).into_response()
}

/// POST /delete/{id}/ - delete, then redirect to the list whatever the outcome
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let flash = Flash::new(session);
    let contact = match owned_contact(&state, &user, &id, &flash).await {
        Ok(contact) => contact,
        Err(response) => return response,
    };

    match state.contacts.delete(user.id, contact.id).await {
        Ok(()) => {
            info!("User {} deleted contact {}", user.id, contact.id);
            flash.success("Contact deleted successfully.").await;
        }
        Err(e) => {
            error!("Failed to delete contact {} for user {}: {}", contact.id, user.id, e);
            flash.error(format!("Failed to delete contact: {}", e)).await;
        }
    }
    Redirect::to("/").into_response()
}

#[derive(Debug, Clone, Copy)]
enum FormMode {
    Create,
    Update(i64),
}

impl FormMode {
    fn title(self) -> &'static str {
        match self {
            FormMode::Create => "Add contact",
            FormMode::Update(_) => "Edit contact",
        }
    }

    fn action(self) -> String {
        match self {
            FormMode::Create => "/create/".to_string(),
            FormMode::Update(id) => format!("/update/{}/", id),
        }
    }

    fn submit_label(self) -> &'static str {
        match self {
            FormMode::Create => "Save",
            FormMode::Update(_) => "Update",
        }
    }
}

async fn render_form(
    flash: &Flash,
    user: &CurrentUser,
    mode: FormMode,
    form: &ContactForm,
    errors: &FormErrors,
) -> Response {
    let messages = flash.take().await;
    let ctx = PageContext::new(mode.title(), Some(user), &messages);
    views::contacts::form_page(&ctx, &mode.action(), mode.submit_label(), form, errors).into_response()
}

/// Resolve the `{id}` segment to a contact owned by `user`.
///
/// Non-numeric ids, unknown ids and other users' ids all give the same 404.
/// Any other store failure is flashed and the user is sent back to the list.
async fn owned_contact(
    state: &AppState,
    user: &CurrentUser,
    raw_id: &str,
    flash: &Flash,
) -> Result<Contact, Response> {
    let Ok(id) = raw_id.parse::<i64>() else {
        return Err(AppError::not_found(format!("Contact {} not found", raw_id)).into_response());
    };

    match state.contacts.find(user.id, id).await {
        Ok(contact) => Ok(contact),
        Err(DatabaseError::NotFound(msg)) => Err(AppError::not_found(msg).into_response()),
        Err(e) => {
            error!("Failed to load contact {} for user {}: {}", id, user.id, e);
            flash.error(format!("Error loading contact: {}", e)).await;
            Err(Redirect::to("/").into_response())
        }
    }
}
