use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

use crate::{
    api::models::{
        ActorRef, AuthResponse, CreateExpenseRequest, CreateParticipantRequest, CreateTripRequest, ErrorResponse,
        ExpenseInput, ExpenseUpdateInput, HealthResponse, LoginRequest, MeResponse, RegisterRequest,
        RevertAllResponse, UpdateExpenseRequest, UpdateParticipantRequest, UpdateTripRequest,
    },
    core::{
        errors::FieldError,
        models::{
            analytics::{
                AnalyticsData, CategoryAmount, CategoryStats, ChartBar, ChartSlice, DailyBalancePoint, DayGroup,
                IndividualShareStat, ParticipantAmount, TotalPayerStat,
            },
            change_log::{ChangeAction, ChangeLogEntry, ItemType},
            expense::ExpenseEntry,
            settlement::{Balances, MoneyStats, Settlement, SettlementSummary},
            trip::{Participant, Trip, TripType},
            user::User,
        },
        services::{TripDetailsView, UserStats},
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("Bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::health,
        super::handlers::register,
        super::handlers::login,
        super::handlers::get_me,
        super::handlers::list_trips,
        super::handlers::create_trip,
        super::handlers::update_trip,
        super::handlers::delete_trip,
        super::handlers::get_trip_view,
        super::handlers::get_balances,
        super::handlers::get_settlements,
        super::handlers::get_analytics,
        super::handlers::add_participant,
        super::handlers::update_participant,
        super::handlers::remove_participant,
        super::handlers::add_expense,
        super::handlers::update_expense,
        super::handlers::delete_expense,
        super::handlers::list_logs,
        super::handlers::revert_log,
        super::handlers::revert_all
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        MeResponse,
        UserStats,
        CreateTripRequest,
        UpdateTripRequest,
        ActorRef,
        CreateParticipantRequest,
        UpdateParticipantRequest,
        ExpenseInput,
        ExpenseUpdateInput,
        CreateExpenseRequest,
        UpdateExpenseRequest,
        RevertAllResponse,
        HealthResponse,
        ErrorResponse,
        FieldError,
        User,
        Trip,
        TripType,
        Participant,
        ExpenseEntry,
        Settlement,
        Balances,
        MoneyStats,
        SettlementSummary,
        ChartSlice,
        ChartBar,
        ParticipantAmount,
        CategoryAmount,
        CategoryStats,
        TotalPayerStat,
        IndividualShareStat,
        AnalyticsData,
        DailyBalancePoint,
        DayGroup,
        ChangeAction,
        ItemType,
        ChangeLogEntry,
        TripDetailsView
    )),
    modifiers(&BearerAuth),
    info(
        title = "SmartSplit API",
        description = "Shared trip expenses, balances, settlements and analytics",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
