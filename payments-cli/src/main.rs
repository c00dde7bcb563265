//! Payments CLI
//!
//! Command-line interface for the Payments API.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use payments_client::PaymentsClient;
use payments_types::{ListPaymentsParams, PaymentId, PaymentMethod, PaymentStatus};

#[derive(Parser)]
#[command(name = "payments")]
#[command(author, version, about = "Payments API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Payments API
    #[arg(
        long,
        env = "PAYMENTS_API_URL",
        default_value = "http://localhost:3000"
    )]
    api_url: String,

    /// Bearer token issued by the auth service
    #[arg(long, env = "PAYMENTS_API_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Payment operations
    Payment {
        #[command(subcommand)]
        action: PaymentCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum PaymentCommands {
    /// Create a payment and print its checkout link
    Create {
        /// Amount, up to two decimal places
        #[arg(long)]
        amount: Decimal,
        /// ISO 4217 code
        #[arg(long, default_value = "IDR")]
        currency: String,
        /// CREDIT_CARD, BANK_TRANSFER, E_WALLET or VIRTUAL_ACCOUNT
        #[arg(long, default_value = "BANK_TRANSFER")]
        method: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Get payment details
    Get {
        /// Payment ID (UUID)
        id: String,
    },
    /// Get a payment by its gateway order ID
    Order {
        order_id: String,
    },
    /// List payments, newest first
    List {
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
        /// PENDING, PAID, CANCELED, EXPIRED or FAILED
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        method: Option<String>,
        /// RFC 3339 timestamp
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// RFC 3339 timestamp
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        #[arg(long)]
        min_amount: Option<Decimal>,
        #[arg(long)]
        max_amount: Option<Decimal>,
    },
    /// Show payment statistics
    Stats,
    /// Cancel a pending payment
    Cancel {
        /// Payment ID (UUID)
        id: String,
    },
    /// Reconcile a payment with the gateway
    Sync {
        /// Payment ID (UUID)
        id: String,
    },
    /// Show the gateway notifications received for a payment
    Notifications {
        /// Payment ID (UUID)
        id: String,
    },
}

fn parse_payment_id(s: &str) -> Result<PaymentId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid payment ID: {}", s))
}

fn parse_method(s: &str) -> Result<PaymentMethod> {
    s.to_uppercase().parse().map_err(|_| {
        anyhow::anyhow!(
            "Unknown payment method: {}. Supported: CREDIT_CARD, BANK_TRANSFER, E_WALLET, VIRTUAL_ACCOUNT",
            s
        )
    })
}

fn parse_status(s: &str) -> Result<PaymentStatus> {
    s.to_uppercase()
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown payment status: {}", s))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = PaymentsClient::new(&cli.api_url);
    if let Some(token) = cli.token {
        client = client.with_token(token);
    }

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Payment { action } => match action {
            PaymentCommands::Create {
                amount,
                currency,
                method,
                description,
            } => {
                let method = parse_method(&method)?;
                let payment = client
                    .create_payment(amount, &currency, method, &description)
                    .await?;
                print_json(&payment)?;
                if let Some(url) = &payment.gateway_redirect_url {
                    println!("Checkout: {}", url);
                }
            }
            PaymentCommands::Get { id } => {
                let payment = client.get_payment(parse_payment_id(&id)?).await?;
                print_json(&payment)?;
            }
            PaymentCommands::Order { order_id } => {
                let payment = client.get_payment_by_order_id(&order_id).await?;
                print_json(&payment)?;
            }
            PaymentCommands::List {
                limit,
                offset,
                status,
                method,
                from,
                to,
                min_amount,
                max_amount,
            } => {
                let params = ListPaymentsParams {
                    limit,
                    offset,
                    status: status.as_deref().map(parse_status).transpose()?,
                    payment_method: method.as_deref().map(parse_method).transpose()?,
                    start_date: from,
                    end_date: to,
                    min_amount,
                    max_amount,
                };
                let page = client.list_payments(&params).await?;
                print_json(&page)?;
            }
            PaymentCommands::Stats => {
                let stats = client.payment_stats().await?;
                print_json(&stats)?;
            }
            PaymentCommands::Cancel { id } => {
                let payment = client.cancel_payment(parse_payment_id(&id)?).await?;
                print_json(&payment)?;
            }
            PaymentCommands::Sync { id } => {
                let payment = client.sync_payment(parse_payment_id(&id)?).await?;
                print_json(&payment)?;
            }
            PaymentCommands::Notifications { id } => {
                let history = client.list_notifications(parse_payment_id(&id)?).await?;
                print_json(&history)?;
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_method_is_case_insensitive() {
        assert_eq!(parse_method("e_wallet").unwrap(), PaymentMethod::EWallet);
        assert!(parse_method("cash").is_err());
    }

    #[test]
    fn test_list_arguments() {
        let cli = Cli::try_parse_from([
            "payments",
            "--token",
            "tok",
            "payment",
            "list",
            "--limit",
            "5",
            "--status",
            "paid",
            "--min-amount",
            "1000.50",
        ])
        .unwrap();

        match cli.command {
            Commands::Payment {
                action:
                    PaymentCommands::List {
                        limit,
                        status,
                        min_amount,
                        ..
                    },
            } => {
                assert_eq!(limit, Some(5));
                assert_eq!(parse_status(&status.unwrap()).unwrap(), PaymentStatus::Paid);
                assert_eq!(min_amount, Some(Decimal::new(100050, 2)));
            }
            _ => panic!("expected payment list"),
        }
    }
}
