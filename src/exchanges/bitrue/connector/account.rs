use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::AccountInfo;
use crate::core::types::Balance;
use crate::exchanges::bitrue::rest::BitrueRestClient;
use crate::exchanges::bitrue::types::{AccountData, BalanceData};
use crate::exchanges::bitrue::EXCHANGE_NAME;
use async_trait::async_trait;
use tracing::instrument;

/// Account implementation for Bitrue
pub struct Account<R: RestClient> {
    rest: BitrueRestClient<R>,
}

impl<R: RestClient> Account<R> {
    pub fn new(rest: &R) -> Self
    where
        R: Clone,
    {
        Self {
            rest: BitrueRestClient::new(rest.clone()),
        }
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn account(&self) -> Result<AccountData, ExchangeError> {
        self.rest.get_account().await
    }

    /// Balance for one asset, `None` if the account holds no entry for it
    pub async fn balance(&self, asset: &str) -> Result<Option<BalanceData>, ExchangeError> {
        let account = self.account().await?;
        Ok(account.balance(asset).cloned())
    }
}

#[async_trait]
impl<R: RestClient> AccountInfo for Account<R> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    async fn get_account_balance(&self) -> Result<Vec<Balance>, ExchangeError> {
        let account = self.rest.get_account().await?;

        let balances = account
            .balances
            .into_iter()
            .filter(|balance| !balance.free.is_zero() || !balance.locked.is_zero())
            .map(Balance::from)
            .collect();

        Ok(balances)
    }
}
