//! Initial database migration.
//!
//! Creates the enums and the three core tables: quotations, payments, and
//! account statements.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(QUOTATIONS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(ACCOUNT_STATEMENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
-- Payment form of a quotation; wire values keep the Spanish terms
CREATE TYPE payment_form AS ENUM ('contado', 'financiado');

-- Quotation-level lifecycle
CREATE TYPE quotation_status AS ENUM (
    'draft',
    'sent',
    'approved',
    'completed',
    'cancelled'
);

-- Service-fulfillment lifecycle, independent of the quotation status
CREATE TYPE service_status AS ENUM (
    'pending',
    'in_process',
    'completed',
    'cancelled'
);

-- What a payment represents
CREATE TYPE payment_type AS ENUM (
    'cash',
    'advance',
    'installment',
    'interest',
    'arrears'
);

-- How a payment was made
CREATE TYPE payment_method AS ENUM ('cash', 'transfer', 'card', 'deposit');

-- Payment lifecycle
CREATE TYPE payment_status AS ENUM (
    'pending',
    'completed',
    'cancelled',
    'refunded',
    'rejected'
);

-- Account statement lifecycle
CREATE TYPE statement_status AS ENUM (
    'active',
    'in_arrears',
    'settled',
    'cancelled',
    'in_process'
);
";

const QUOTATIONS_SQL: &str = r"
CREATE TABLE quotations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    client_id UUID NOT NULL,
    created_by UUID NOT NULL,
    branch_id UUID NOT NULL,
    valid_until TIMESTAMPTZ NOT NULL,

    -- Line items as an ordered JSONB document; derived figures inside are
    -- recomputed on every save
    items JSONB NOT NULL DEFAULT '[]',
    subtotal DECIMAL(14, 2) NOT NULL DEFAULT 0,
    tax DECIMAL(14, 2) NOT NULL DEFAULT 0,
    sale_total DECIMAL(14, 2) NOT NULL DEFAULT 0,

    payment_form payment_form NOT NULL,
    cash_payment_id UUID,

    -- Financing sub-record, all columns set on the financed branch and
    -- all null on the cash branch
    financing_down_payment DECIMAL(14, 2),
    financing_term_weeks INTEGER,
    financing_interest_rate DECIMAL(8, 4),
    financing_remaining_balance DECIMAL(14, 2),
    financing_weekly_payment DECIMAL(14, 2),
    financing_start_date DATE,
    financing_end_date DATE,

    status quotation_status NOT NULL DEFAULT 'draft',
    service_status service_status NOT NULL DEFAULT 'pending',
    service_started_at TIMESTAMPTZ,
    service_completed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_financing_term CHECK (
        financing_term_weeks IS NULL OR financing_term_weeks >= 1
    )
);

CREATE INDEX idx_quotations_client ON quotations(client_id);
CREATE INDEX idx_quotations_branch ON quotations(branch_id);
CREATE INDEX idx_quotations_status ON quotations(status);
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    quotation_id UUID NOT NULL REFERENCES quotations(id) ON DELETE CASCADE,
    client_id UUID NOT NULL,
    reference VARCHAR(32) NOT NULL UNIQUE,
    payment_type payment_type NOT NULL,
    -- Null while the installment is scheduled, set when it is collected
    method payment_method,
    status payment_status NOT NULL DEFAULT 'pending',
    amount DECIMAL(14, 2) NOT NULL,
    balance_after DECIMAL(14, 2),
    due_date DATE,
    paid_at TIMESTAMPTZ,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_payment_amount CHECK (amount > 0)
);

CREATE INDEX idx_payments_quotation ON payments(quotation_id);
CREATE INDEX idx_payments_client ON payments(client_id);
CREATE INDEX idx_payments_status ON payments(status);
CREATE INDEX idx_payments_due_date ON payments(due_date) WHERE status = 'pending';
";

const ACCOUNT_STATEMENTS_SQL: &str = r"
CREATE TABLE account_statements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    quotation_id UUID NOT NULL UNIQUE REFERENCES quotations(id) ON DELETE CASCADE,
    client_id UUID NOT NULL,
    initial_balance DECIMAL(14, 2) NOT NULL,
    payments_total DECIMAL(14, 2) NOT NULL DEFAULT 0,
    current_balance DECIMAL(14, 2) NOT NULL,
    due_date DATE NOT NULL,
    weekly_payment DECIMAL(14, 2) NOT NULL,
    days_in_arrears BIGINT NOT NULL DEFAULT 0,
    moratory_interest DECIMAL(14, 2) NOT NULL DEFAULT 0,
    moratory_daily_rate DECIMAL(8, 4) NOT NULL,
    status statement_status NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_current_balance CHECK (current_balance >= 0)
);

CREATE INDEX idx_statements_client ON account_statements(client_id);
CREATE INDEX idx_statements_status ON account_statements(status);
";

const DROP_SQL: &str = r"
-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS account_statements CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS quotations CASCADE;

-- Drop enums
DROP TYPE IF EXISTS statement_status CASCADE;
DROP TYPE IF EXISTS payment_status CASCADE;
DROP TYPE IF EXISTS payment_method CASCADE;
DROP TYPE IF EXISTS payment_type CASCADE;
DROP TYPE IF EXISTS service_status CASCADE;
DROP TYPE IF EXISTS quotation_status CASCADE;
DROP TYPE IF EXISTS payment_form CASCADE;
";
