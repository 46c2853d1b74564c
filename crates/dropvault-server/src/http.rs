//! HTTP routes.
//!
//! | Method | Path               | Store operation              |
//! |--------|--------------------|------------------------------|
//! | POST   | /encrypt           | `crypto::encrypt_text`       |
//! | POST   | /decrypt           | `crypto::decrypt_text`       |
//! | POST   | /register          | `UserStore::register`        |
//! | POST   | /login             | `UserStore::login`           |
//! | POST   | /forgot-password   | `UserStore::forgot_password` |
//! | POST   | /send-data         | `MailboxStore::deposit`      |
//! | POST   | /retrieve-data     | `MailboxStore::withdraw`     |
//! | GET    | /list-databases    | `CatalogStore::list_databases` |
//! | GET    | /list-tables       | `TableStore::list_tables`    |
//! | GET    | /view-table-data   | `RecordStore::view`          |
//! | POST   | /create-database   | `CatalogStore::create_database` |
//! | POST   | /create-table      | `TableStore::create_table`   |
//! | POST   | /insert-data       | `RecordStore::insert`        |

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use dropvault::crypto::{decrypt_text, encrypt_text};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

use crate::context::AppContext;
use crate::http_utils::{handle_rejection, into_response, ApiError};

/// Largest accepted JSON request body.
const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

// ── Request bodies ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EncryptBody {
    data: String,
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptBody {
    encrypted_data: String,
    key: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    username: String,
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordBody {
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct SendDataBody {
    token: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveDataBody {
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseParams {
    db_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableParams {
    db_name: String,
    table_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertDataBody {
    db_name: String,
    table_name: String,
    data: Value,
}

// ── Filters ───────────────────────────────────────────────────────────────────

fn with_context(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = (Arc<AppContext>,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

fn json_body<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// All API routes, plus static files from `public_dir` if given.
pub fn routes(ctx: Arc<AppContext>, public_dir: Option<PathBuf>) -> BoxedFilter<(Response,)> {
    // Path before method, so an unknown path rejects as 404 rather than 405.
    let post = |path: &'static str| warp::path(path).and(warp::path::end()).and(warp::post());
    let get = |path: &'static str| warp::path(path).and(warp::path::end()).and(warp::get());

    let encrypt_route = post("encrypt")
        .and(json_body::<EncryptBody>())
        .and(with_context(ctx.clone()))
        .then(encrypt)
        .map(into_response);
    let decrypt_route = post("decrypt")
        .and(json_body::<DecryptBody>())
        .and(with_context(ctx.clone()))
        .then(decrypt)
        .map(into_response);
    let register_route = post("register")
        .and(json_body::<CredentialsBody>())
        .and(with_context(ctx.clone()))
        .then(register)
        .map(into_response);
    let login_route = post("login")
        .and(json_body::<CredentialsBody>())
        .and(with_context(ctx.clone()))
        .then(login)
        .map(into_response);
    let forgot_password_route = post("forgot-password")
        .and(json_body::<ForgotPasswordBody>())
        .and(with_context(ctx.clone()))
        .then(forgot_password)
        .map(into_response);
    let send_data_route = post("send-data")
        .and(json_body::<SendDataBody>())
        .and(with_context(ctx.clone()))
        .then(send_data)
        .map(into_response);
    let retrieve_data_route = post("retrieve-data")
        .and(json_body::<RetrieveDataBody>())
        .and(with_context(ctx.clone()))
        .then(retrieve_data)
        .map(into_response);
    let list_databases_route = get("list-databases")
        .and(with_context(ctx.clone()))
        .then(list_databases)
        .map(into_response);
    let list_tables_route = get("list-tables")
        .and(warp::query::<DatabaseParams>())
        .and(with_context(ctx.clone()))
        .then(list_tables)
        .map(into_response);
    let view_table_data_route = get("view-table-data")
        .and(warp::query::<TableParams>())
        .and(with_context(ctx.clone()))
        .then(view_table_data)
        .map(into_response);
    let create_database_route = post("create-database")
        .and(json_body::<DatabaseParams>())
        .and(with_context(ctx.clone()))
        .then(create_database)
        .map(into_response);
    let create_table_route = post("create-table")
        .and(json_body::<TableParams>())
        .and(with_context(ctx.clone()))
        .then(create_table)
        .map(into_response);
    let insert_data_route = post("insert-data")
        .and(json_body::<InsertDataBody>())
        .and(with_context(ctx))
        .then(insert_data)
        .map(into_response);

    let api = encrypt_route
        .or(decrypt_route)
        .unify()
        .or(register_route)
        .unify()
        .or(login_route)
        .unify()
        .or(forgot_password_route)
        .unify()
        .or(send_data_route)
        .unify()
        .or(retrieve_data_route)
        .unify()
        .or(list_databases_route)
        .unify()
        .or(list_tables_route)
        .unify()
        .or(view_table_data_route)
        .unify()
        .or(create_database_route)
        .unify()
        .or(create_table_route)
        .unify()
        .or(insert_data_route)
        .unify()
        .boxed();

    match public_dir {
        Some(dir) => api
            .or(warp::fs::dir(dir).map(|file: warp::fs::File| file.into_response()))
            .unify()
            .boxed(),
        None => api,
    }
}

/// The complete service: routes, JSON rejection handling and request tracing.
pub fn app(
    ctx: Arc<AppContext>,
    public_dir: Option<PathBuf>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    routes(ctx, public_dir)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

// POST /encrypt
async fn encrypt(body: EncryptBody, ctx: Arc<AppContext>) -> Result<impl Reply, ApiError> {
    let encrypted = ctx
        .run_blocking(move || encrypt_text(&body.data, &body.key))
        .await?;
    Ok(warp::reply::json(&json!({ "encryptedData": encrypted })))
}

// POST /decrypt
async fn decrypt(body: DecryptBody, ctx: Arc<AppContext>) -> Result<impl Reply, ApiError> {
    let decrypted = ctx
        .run_blocking(move || decrypt_text(&body.encrypted_data, &body.key))
        .await?;
    Ok(warp::reply::json(&json!({ "decryptedData": decrypted })))
}

// POST /register
async fn register(body: CredentialsBody, ctx: Arc<AppContext>) -> Result<impl Reply, ApiError> {
    let users = ctx.users.clone();
    ctx.run_blocking(move || users.register(&body.username, &body.email))
        .await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "message": "User registered successfully" })),
        StatusCode::CREATED,
    ))
}

// POST /login
async fn login(body: CredentialsBody, ctx: Arc<AppContext>) -> Result<impl Reply, ApiError> {
    let users = ctx.users.clone();
    let token = ctx
        .run_blocking(move || users.login(&body.username, &body.email))
        .await?;
    Ok(warp::reply::json(
        &json!({ "message": "Login successful", "token": token }),
    ))
}

// POST /forgot-password
async fn forgot_password(
    body: ForgotPasswordBody,
    ctx: Arc<AppContext>,
) -> Result<impl Reply, ApiError> {
    let users = ctx.users.clone();
    ctx.run_blocking(move || users.forgot_password(&body.email))
        .await?;
    Ok(warp::reply::json(
        &json!({ "message": "Password reset email sent" }),
    ))
}

// POST /send-data
async fn send_data(body: SendDataBody, ctx: Arc<AppContext>) -> Result<impl Reply, ApiError> {
    let mailbox = ctx.storage.mailbox.clone();
    let path = ctx
        .run_blocking(move || mailbox.deposit(&body.token, &body.data))
        .await?;
    Ok(warp::reply::json(&json!({
        "message": "Data sent successfully",
        "filePath": path.display().to_string(),
    })))
}

// POST /retrieve-data
async fn retrieve_data(
    body: RetrieveDataBody,
    ctx: Arc<AppContext>,
) -> Result<impl Reply, ApiError> {
    let mailbox = ctx.storage.mailbox.clone();
    let withdrawal = ctx
        .run_consuming(move || mailbox.withdraw(&body.token))
        .await?;
    Ok(warp::reply::json(&json!({
        "data": withdrawal.payload,
        "filename": withdrawal.name,
    })))
}

// GET /list-databases
async fn list_databases(ctx: Arc<AppContext>) -> Result<impl Reply, ApiError> {
    let catalog = ctx.storage.catalog.clone();
    let names = ctx.run_blocking(move || catalog.list_databases()).await?;
    Ok(warp::reply::json(&names))
}

// GET /list-tables?dbName=
async fn list_tables(
    params: DatabaseParams,
    ctx: Arc<AppContext>,
) -> Result<impl Reply, ApiError> {
    let tables = ctx.storage.tables.clone();
    let names = ctx
        .run_blocking(move || tables.list_tables(&params.db_name))
        .await?;
    Ok(warp::reply::json(&names))
}

// GET /view-table-data?dbName=&tableName=
async fn view_table_data(
    params: TableParams,
    ctx: Arc<AppContext>,
) -> Result<impl Reply, ApiError> {
    let records = ctx.storage.records.clone();
    let rows = ctx
        .run_blocking(move || records.view(&params.db_name, &params.table_name))
        .await?;
    Ok(warp::reply::json(&rows))
}

// POST /create-database
async fn create_database(
    body: DatabaseParams,
    ctx: Arc<AppContext>,
) -> Result<impl Reply, ApiError> {
    let catalog = ctx.storage.catalog.clone();
    ctx.run_blocking(move || catalog.create_database(&body.db_name))
        .await?;
    Ok(warp::reply::json(
        &json!({ "message": "Database created successfully" }),
    ))
}

// POST /create-table
async fn create_table(body: TableParams, ctx: Arc<AppContext>) -> Result<impl Reply, ApiError> {
    let tables = ctx.storage.tables.clone();
    ctx.run_blocking(move || tables.create_table(&body.db_name, &body.table_name))
        .await
        .map_err(ApiError::not_found_as_bad_request)?;
    Ok(warp::reply::json(
        &json!({ "message": "Table created successfully" }),
    ))
}

// POST /insert-data
async fn insert_data(body: InsertDataBody, ctx: Arc<AppContext>) -> Result<impl Reply, ApiError> {
    let records = ctx.storage.records.clone();
    ctx.run_blocking(move || records.insert(&body.db_name, &body.table_name, &body.data))
        .await
        .map_err(ApiError::not_found_as_bad_request)?;
    Ok(warp::reply::json(
        &json!({ "message": "Data inserted successfully" }),
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
