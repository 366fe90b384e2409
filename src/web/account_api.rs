use actix_web::{web, HttpRequest, HttpResponse};

use crate::domain::account::{AccountError, AccountNumber, Balance};
use crate::domain::shared::{AccountStatus, AccountType, CustomerNumber};
use crate::services::AccountService;

use super::dto::{AccountResponse, CloseQuery, CreateAccountRequest, TransactionRequest, UpdateStatusRequest};
use super::ApiSettings;

/// Expects `Data<AccountService>` and `Data<ApiSettings>`.
pub fn account_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/accounts")
            .route("", web::post().to(create_account))
            .route("/customer/{customer_number}", web::get().to(accounts_by_customer))
            .route("/{account_number}", web::get().to(get_account))
            .route("/{account_number}", web::delete().to(close_account))
            .route("/{account_number}/status", web::put().to(update_status))
            .route("/{account_number}/credit", web::post().to(credit))
            .route("/{account_number}/debit", web::post().to(debit)),
    );
}

fn account_number(raw: String) -> Result<AccountNumber, AccountError> {
    Ok(AccountNumber::parse(raw)?)
}

async fn create_account(
    req: HttpRequest,
    service: web::Data<AccountService>,
    settings: web::Data<ApiSettings>,
    body: web::Json<CreateAccountRequest>,
) -> Result<HttpResponse, AccountError> {
    let body = body.into_inner();
    let customer_number = CustomerNumber::parse(body.customer_number)?;
    let account_type: AccountType = body.account_type.parse()?;

    let ctx = settings.call_context(&req);
    let account = service.create_account(&ctx, &customer_number, account_type).await?;
    Ok(HttpResponse::Created().json(AccountResponse::from(&account)))
}

async fn get_account(
    service: web::Data<AccountService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AccountError> {
    let number = account_number(path.into_inner())?;
    let account = service.get_account(&number).await?;
    Ok(HttpResponse::Ok().json(AccountResponse::from(&account)))
}

async fn accounts_by_customer(
    service: web::Data<AccountService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AccountError> {
    let customer_number = CustomerNumber::parse(path.into_inner())?;
    let accounts = service.get_accounts_by_customer(&customer_number).await?;
    let body: Vec<AccountResponse> = accounts.iter().map(AccountResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

async fn update_status(
    req: HttpRequest,
    service: web::Data<AccountService>,
    settings: web::Data<ApiSettings>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AccountError> {
    let number = account_number(path.into_inner())?;
    let body = body.into_inner();
    let target: AccountStatus = body.status.parse()?;

    let ctx = settings.call_context(&req);
    let account = service.update_status(&ctx, &number, target, body.reason).await?;
    Ok(HttpResponse::Ok().json(AccountResponse::from(&account)))
}

async fn credit(
    req: HttpRequest,
    service: web::Data<AccountService>,
    settings: web::Data<ApiSettings>,
    path: web::Path<String>,
    body: web::Json<TransactionRequest>,
) -> Result<HttpResponse, AccountError> {
    let number = account_number(path.into_inner())?;
    let body = body.into_inner();
    let amount = Balance::new(body.amount)?;

    let ctx = settings.call_context(&req);
    let account = service.credit(&ctx, &number, amount, body.description).await?;
    Ok(HttpResponse::Ok().json(AccountResponse::from(&account)))
}

async fn debit(
    req: HttpRequest,
    service: web::Data<AccountService>,
    settings: web::Data<ApiSettings>,
    path: web::Path<String>,
    body: web::Json<TransactionRequest>,
) -> Result<HttpResponse, AccountError> {
    let number = account_number(path.into_inner())?;
    let body = body.into_inner();
    let amount = Balance::new(body.amount)?;

    let ctx = settings.call_context(&req);
    let account = service.debit(&ctx, &number, amount, body.description).await?;
    Ok(HttpResponse::Ok().json(AccountResponse::from(&account)))
}

async fn close_account(
    req: HttpRequest,
    service: web::Data<AccountService>,
    settings: web::Data<ApiSettings>,
    path: web::Path<String>,
    query: web::Query<CloseQuery>,
) -> Result<HttpResponse, AccountError> {
    let number = account_number(path.into_inner())?;
    let ctx = settings.call_context(&req);
    service.close(&ctx, &number, query.into_inner().reason).await?;
    Ok(HttpResponse::NoContent().finish())
}
