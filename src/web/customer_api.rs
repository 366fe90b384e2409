use actix_web::{web, HttpRequest, HttpResponse};

use crate::domain::customer::{Address, CustomerError, CustomerName, CustomerType, NationalId};
use crate::domain::shared::{CustomerNumber, CustomerStatus};
use crate::services::{AccountActivityProjection, CustomerChanges, CustomerService, RegisterCustomer};

use super::dto::{
    CreateCustomerRequest, CustomerActivityResponse, CustomerResponse, SearchQuery, UpdateCustomerRequest,
    UpdateStatusRequest,
};
use super::ApiSettings;

/// Expects `Data<CustomerService>`, `Data<AccountActivityProjection>` and `Data<ApiSettings>`.
pub fn customer_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/customers")
            .route("", web::post().to(create_customer))
            // before /{customer_number} so "search" is not taken for a number
            .route("/search", web::get().to(search_customers))
            .route("/{customer_number}", web::get().to(get_customer))
            .route("/{customer_number}", web::put().to(update_customer))
            .route("/{customer_number}/status", web::put().to(update_status))
            .route("/{customer_number}/accounts", web::get().to(customer_accounts))
            .route("/{customer_number}/accounts/active", web::get().to(active_accounts))
            .route("/{customer_number}/activity", web::get().to(account_activity)),
    );
}

fn customer_number(raw: String) -> Result<CustomerNumber, CustomerError> {
    Ok(CustomerNumber::parse(raw)?)
}

async fn create_customer(
    req: HttpRequest,
    service: web::Data<CustomerService>,
    settings: web::Data<ApiSettings>,
    body: web::Json<CreateCustomerRequest>,
) -> Result<HttpResponse, CustomerError> {
    let body = body.into_inner();
    let request = RegisterCustomer {
        name: CustomerName::parse(&body.name)?,
        national_id: NationalId::parse(&body.national_id)?,
        customer_type: body.customer_type.parse::<CustomerType>()?,
        address: Address::parse(&body.address)?,
    };

    let ctx = settings.call_context(&req);
    let customer = service.create_customer(&ctx, request).await?;
    Ok(HttpResponse::Created().json(CustomerResponse::from(&customer)))
}

async fn get_customer(
    service: web::Data<CustomerService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomerError> {
    let number = customer_number(path.into_inner())?;
    let customer = service.get_customer(&number).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(&customer)))
}

async fn search_customers(
    service: web::Data<CustomerService>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, CustomerError> {
    let customers = service.search_customers(&query.name).await?;
    let body: Vec<CustomerResponse> = customers.iter().map(CustomerResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

async fn update_customer(
    req: HttpRequest,
    service: web::Data<CustomerService>,
    settings: web::Data<ApiSettings>,
    path: web::Path<String>,
    body: web::Json<UpdateCustomerRequest>,
) -> Result<HttpResponse, CustomerError> {
    let number = customer_number(path.into_inner())?;
    let body = body.into_inner();
    let changes = CustomerChanges {
        name: body.name.as_deref().map(CustomerName::parse).transpose()?,
        address: body.address.as_deref().map(Address::parse).transpose()?,
        customer_type: body.customer_type.as_deref().map(str::parse::<CustomerType>).transpose()?,
    };

    let ctx = settings.call_context(&req);
    let customer = service.update_customer(&ctx, &number, changes).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(&customer)))
}

async fn update_status(
    req: HttpRequest,
    service: web::Data<CustomerService>,
    settings: web::Data<ApiSettings>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, CustomerError> {
    let number = customer_number(path.into_inner())?;
    let body = body.into_inner();
    let target: CustomerStatus = body.status.parse()?;

    let ctx = settings.call_context(&req);
    let customer = service.update_status(&ctx, &number, target, body.reason).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(&customer)))
}

async fn customer_accounts(
    req: HttpRequest,
    service: web::Data<CustomerService>,
    settings: web::Data<ApiSettings>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomerError> {
    let number = customer_number(path.into_inner())?;
    let ctx = settings.call_context(&req);
    let accounts = service.customer_accounts(&ctx, &number).await?;
    Ok(HttpResponse::Ok().json(accounts))
}

async fn active_accounts(
    req: HttpRequest,
    service: web::Data<CustomerService>,
    settings: web::Data<ApiSettings>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomerError> {
    let number = customer_number(path.into_inner())?;
    let ctx = settings.call_context(&req);
    let active = service.active_accounts(&ctx, &number).await?;
    Ok(HttpResponse::Ok().json(active))
}

async fn account_activity(
    service: web::Data<CustomerService>,
    projection: web::Data<AccountActivityProjection>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomerError> {
    let number = customer_number(path.into_inner())?;
    service.get_customer(&number).await?;
    let activity = projection.activity(&number).unwrap_or_default();
    Ok(HttpResponse::Ok().json(CustomerActivityResponse::new(number.as_str(), &activity)))
}
