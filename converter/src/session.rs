//! The converter session: one screen's worth of state and the operations on it.

use std::sync::Arc;

use parking_lot::RwLock;
use tcurrency_common::{CurrencyCode, Timestamp};
use tcurrency_fx::{RateRepository, RateSource};
use tcurrency_ledger::{
    LedgerSnapshot, MultiCurrencyLedger, SelectedCurrencySet, SelectionError, Toggled,
};
use tracing::{debug, info, instrument, warn};

use crate::calculator::{CalculatorInputMachine, KeyEvent};
use crate::config::ConverterConfig;
use crate::error::ConverterResult;
use crate::settings::{Settings, SettingsPatch};
use crate::store::SettingsStore;

/// Currency whose row picks up [`Settings::custom_home_flag`].
const CUSTOM_FLAG_CURRENCY: &str = "TWD";

struct SessionState {
    settings: Settings,
    selection: SelectedCurrencySet,
    ledger: MultiCurrencyLedger,
    calculator: CalculatorInputMachine,
    last_update: Option<Timestamp>,
    /// Rate fetches currently in flight.
    fetches_in_flight: usize,
    data_unavailable: bool,
}

/// Ties the rate repository, ledger, keypad and persisted settings together.
///
/// All state sits behind one lock that is never held across an await, so a
/// refresh in flight does not block key presses. Rates arriving mid-edit are
/// applied by recomputing from the active currency's current text.
pub struct Converter {
    config: ConverterConfig,
    base: CurrencyCode,
    repository: Arc<RateRepository>,
    store: Arc<dyn SettingsStore>,
    state: RwLock<SessionState>,
}

impl Converter {
    /// Create a session. Nothing is loaded until [`Converter::load`].
    pub fn new(
        config: ConverterConfig,
        repository: Arc<RateRepository>,
        store: Arc<dyn SettingsStore>,
    ) -> ConverterResult<Self> {
        config.validate()?;
        let base = config.base()?;
        let settings = Settings::default();

        Ok(Self {
            state: RwLock::new(SessionState {
                ledger: MultiCurrencyLedger::new(settings.decimal_places),
                settings,
                selection: SelectedCurrencySet::default(),
                calculator: CalculatorInputMachine::new(),
                last_update: None,
                fetches_in_flight: 0,
                data_unavailable: false,
            }),
            config,
            base,
            repository,
            store,
        })
    }

    /// Create a session with its own repository over `source`.
    pub fn with_source(
        config: ConverterConfig,
        source: Arc<dyn RateSource>,
        store: Arc<dyn SettingsStore>,
    ) -> ConverterResult<Self> {
        let repository = Arc::new(RateRepository::new(source, config.repository_config()));
        Self::new(config, repository, store)
    }

    /// Restore settings and selection, then load rates.
    ///
    /// A failed rate load leaves the ledger at its reset amounts and is
    /// returned to the caller.
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn load(&self) -> ConverterResult<()> {
        let settings = self.store.settings();
        let selection = self.store.selected_currencies();
        info!(
            currencies = selection.len(),
            decimal_places = settings.decimal_places,
            "Loading converter session"
        );

        {
            let mut state = self.state.write();
            state.ledger.set_decimal_places(settings.decimal_places);
            state.ledger.reset(selection.codes(), settings.default_amount);
            state.calculator.reset();
            state.settings = settings;
            state.selection = selection;
            if state.ledger.rate_table().is_some() {
                state.ledger.recompute();
            }
        }

        self.fetch_rates().await
    }

    /// Drop cached rates and fetch again.
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn on_refresh(&self) -> ConverterResult<()> {
        self.repository.invalidate();
        self.fetch_rates().await
    }

    async fn fetch_rates(&self) -> ConverterResult<()> {
        self.state.write().fetches_in_flight += 1;

        let result = self.repository.fetch(&self.base).await;

        let mut state = self.state.write();
        state.fetches_in_flight = state.fetches_in_flight.saturating_sub(1);

        match result {
            Ok(table) => {
                state.last_update = Some(table.fetched_at);
                state.data_unavailable = false;
                state.ledger.set_rate_table(table);
                state.ledger.recompute();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Rates unavailable, keeping current amounts");
                state.data_unavailable = true;
                Err(e.into())
            }
        }
    }

    /// Feed a keypad press to the active currency.
    ///
    /// Keys pressed before any rates are loaded are dropped without reaching
    /// the keypad. Returns whether the ledger changed.
    pub fn on_key_press(&self, key: KeyEvent) -> bool {
        let mut guard = self.state.write();
        let state = &mut *guard;

        if state.ledger.rate_table().is_none() {
            debug!(?key, "No rates loaded; key ignored");
            return false;
        }

        let Some(active) = state.ledger.active().cloned() else {
            debug!(?key, "No active currency; key ignored");
            return false;
        };

        match state.calculator.press(key) {
            Some(display) => state.ledger.set_amount(&active, &display),
            None => false,
        }
    }

    /// Text typed straight into a currency's field.
    pub fn on_amount_edited(&self, currency: &CurrencyCode, text: &str) -> bool {
        let mut state = self.state.write();
        state.calculator.reset();
        state.ledger.set_amount(currency, text)
    }

    /// Make `currency` the one being edited.
    pub fn focus(&self, currency: &CurrencyCode) -> bool {
        let mut state = self.state.write();
        if state.ledger.active() == Some(currency) {
            return true;
        }
        if state.ledger.focus(currency) {
            state.calculator.reset();
            true
        } else {
            false
        }
    }

    pub fn add_currency(&self, code: CurrencyCode) -> ConverterResult<()> {
        self.edit_selection(|selection| selection.add(code))
    }

    pub fn remove_currency(&self, code: &CurrencyCode) -> ConverterResult<()> {
        self.edit_selection(|selection| selection.remove(code))
    }

    /// Swap the currency at `index`, returning the one it replaced.
    pub fn replace_currency(&self, index: usize, code: CurrencyCode) -> ConverterResult<CurrencyCode> {
        self.edit_selection(|selection| selection.replace(index, code))
    }

    pub fn toggle_currency(&self, code: CurrencyCode) -> ConverterResult<Toggled> {
        self.edit_selection(|selection| selection.toggle(code))
    }

    /// Apply `edit` to a copy of the selection, persist it, then reset the ledger.
    fn edit_selection<T>(
        &self,
        edit: impl FnOnce(&mut SelectedCurrencySet) -> Result<T, SelectionError>,
    ) -> ConverterResult<T> {
        let mut state = self.state.write();

        let mut next = state.selection.clone();
        let outcome = edit(&mut next)?;
        self.store.save_selected_currencies(&next)?;

        info!(currencies = ?next.codes(), "Currency selection updated");

        let default_amount = state.settings.default_amount;
        state.ledger.reset(next.codes(), default_amount);
        state.calculator.reset();
        state.selection = next;
        if state.ledger.rate_table().is_some() {
            state.ledger.recompute();
        }

        Ok(outcome)
    }

    /// Merge `patch` into the settings and persist the result.
    pub fn update_settings(&self, patch: SettingsPatch) -> ConverterResult<Settings> {
        let mut state = self.state.write();

        let next = patch.apply(&state.settings);
        next.validate()?;
        self.store.save_settings(&next)?;

        if next.decimal_places != state.ledger.decimal_places() {
            state.ledger.set_decimal_places(next.decimal_places);
            state.ledger.recompute();
        }
        state.settings = next.clone();

        debug!(?patch, "Settings updated");
        Ok(next)
    }

    /// Everything the screen needs to render.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.read();

        let mut snapshot = state.ledger.snapshot();
        snapshot.last_update = state.last_update;
        snapshot.loading = state.fetches_in_flight > 0;
        snapshot.data_unavailable = state.data_unavailable;

        if let Some(flag) = &state.settings.custom_home_flag {
            for row in snapshot
                .rows
                .iter_mut()
                .filter(|r| r.currency.code() == CUSTOM_FLAG_CURRENCY)
            {
                row.descriptor.flag = flag.clone();
            }
        }

        snapshot
    }

    pub fn settings(&self) -> Settings {
        self.state.read().settings.clone()
    }

    pub fn selection(&self) -> SelectedCurrencySet {
        self.state.read().selection.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().fetches_in_flight > 0
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<RateRepository> {
        &self.repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConverterError;
    use crate::store::MemorySettingsStore;
    use std::time::Duration;
    use tcurrency_fx::{FxError, MockRateSource, RateTable};
    use tokio_test::{assert_err, assert_ok};

    fn codes(list: &[&str]) -> Vec<CurrencyCode> {
        list.iter().map(|c| CurrencyCode::new(*c)).collect()
    }

    fn usd_table() -> RateTable {
        RateTable::from_pairs(
            CurrencyCode::usd(),
            [("USD", 1.0), ("EUR", 0.9), ("JPY", 150.0), ("TWD", 32.0), ("KRW", 1300.0)],
        )
    }

    fn keys(converter: &Converter, tokens: &str) {
        for token in tokens.split_whitespace() {
            converter.on_key_press(token.parse().unwrap());
        }
    }

    fn setup(list: &[&str]) -> (Arc<MockRateSource>, Arc<MemorySettingsStore>, Converter) {
        let source = Arc::new(MockRateSource::new("mock"));
        source.set_table(usd_table());

        let store = Arc::new(MemorySettingsStore::with(
            Settings::default(),
            SelectedCurrencySet::new(codes(list)).unwrap(),
        ));

        let converter =
            Converter::with_source(ConverterConfig::default(), source.clone(), store.clone()).unwrap();
        (source, store, converter)
    }

    #[tokio::test]
    async fn test_load_populates_ledger() {
        let (source, _store, converter) = setup(&["USD", "EUR", "JPY"]);

        converter.load().await.unwrap();

        let snapshot = converter.snapshot();
        assert_eq!(snapshot.active, Some(CurrencyCode::usd()));
        assert_eq!(snapshot.amount(&CurrencyCode::usd()), Some("100"));
        assert_eq!(snapshot.amount(&CurrencyCode::eur()), Some("90.00"));
        assert_eq!(snapshot.amount(&CurrencyCode::jpy()), Some("15000.00"));
        assert_eq!(snapshot.base, Some(CurrencyCode::usd()));
        assert!(snapshot.last_update.is_some());
        assert!(!snapshot.loading);
        assert!(!snapshot.data_unavailable);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_keypad_drives_ledger() {
        let (_source, _store, converter) = setup(&["USD", "EUR"]);
        converter.load().await.unwrap();

        keys(&converter, "1 2 + 3 =");

        let snapshot = converter.snapshot();
        assert_eq!(snapshot.amount(&CurrencyCode::usd()), Some("15"));
        assert_eq!(snapshot.amount(&CurrencyCode::eur()), Some("13.50"));
    }

    #[tokio::test]
    async fn test_keys_before_rates_are_ignored_by_ledger() {
        let (source, _store, converter) = setup(&["USD", "EUR"]);
        source.set_failing(true);

        assert_err!(converter.load().await);
        assert!(!converter.on_key_press(KeyEvent::Digit(5)));

        let snapshot = converter.snapshot();
        assert_eq!(snapshot.amount(&CurrencyCode::usd()), Some("100"));
        assert_eq!(snapshot.amount(&CurrencyCode::eur()), Some("0"));
        assert!(snapshot.data_unavailable);
        assert!(snapshot.last_update.is_none());

        source.set_failing(false);
        assert_ok!(converter.on_refresh().await);
        assert!(converter.on_key_press(KeyEvent::Digit(6)));

        let snapshot = converter.snapshot();
        assert_eq!(snapshot.amount(&CurrencyCode::usd()), Some("6"));
        assert_eq!(snapshot.amount(&CurrencyCode::eur()), Some("5.40"));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_amounts() {
        let (source, _store, converter) = setup(&["USD", "EUR"]);
        converter.load().await.unwrap();
        converter.on_amount_edited(&CurrencyCode::eur(), "45");
        let before = converter.snapshot();

        source.set_failing(true);
        let result = converter.on_refresh().await;

        assert!(matches!(result, Err(ConverterError::Fx(FxError::Network(_)))));
        let after = converter.snapshot();
        assert!(after.data_unavailable);
        assert_eq!(after.rows, before.rows);
        assert_eq!(after.last_update, before.last_update);

        source.set_failing(false);
        assert_ok!(converter.on_refresh().await);
        assert!(!converter.snapshot().data_unavailable);
    }

    #[tokio::test]
    async fn test_refresh_applies_new_rates_to_active_text() {
        let (source, _store, converter) = setup(&["USD", "EUR"]);
        converter.load().await.unwrap();
        converter.on_amount_edited(&CurrencyCode::usd(), "10");

        source.set_table(RateTable::from_pairs(CurrencyCode::usd(), [("EUR", 0.5)]));
        converter.on_refresh().await.unwrap();

        let snapshot = converter.snapshot();
        assert_eq!(snapshot.amount(&CurrencyCode::usd()), Some("10"));
        assert_eq!(snapshot.amount(&CurrencyCode::eur()), Some("5.00"));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_loading_flag_while_in_flight() {
        let source = Arc::new(MockRateSource::new("slow").with_delay(Duration::from_millis(100)));
        source.set_table(usd_table());
        let converter = Arc::new(
            Converter::with_source(
                ConverterConfig::default(),
                source,
                Arc::new(MemorySettingsStore::new()),
            )
            .unwrap(),
        );

        let task = {
            let converter = converter.clone();
            tokio::spawn(async move { converter.load().await })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(converter.is_loading());
        assert!(converter.snapshot().loading);

        task.await.unwrap().unwrap();
        assert!(!converter.is_loading());
    }

    #[tokio::test]
    async fn test_loading_until_last_overlapping_fetch_finishes() {
        let source = Arc::new(MockRateSource::new("slow").with_delay(Duration::from_millis(200)));
        source.set_table(usd_table());
        let converter = Arc::new(
            Converter::with_source(
                ConverterConfig::default(),
                source,
                Arc::new(MemorySettingsStore::new()),
            )
            .unwrap(),
        );

        let first = {
            let converter = converter.clone();
            tokio::spawn(async move { converter.load().await })
        };
        tokio::time::sleep(Duration::from_millis(80)).await;
        let second = {
            let converter = converter.clone();
            tokio::spawn(async move { converter.on_refresh().await })
        };

        assert_ok!(first.await.unwrap());
        assert!(converter.is_loading());

        assert_ok!(second.await.unwrap());
        assert!(!converter.is_loading());
        assert!(!converter.snapshot().loading);
    }

    #[tokio::test]
    async fn test_focus_resets_calculator() {
        let (_source, _store, converter) = setup(&["USD", "EUR"]);
        converter.load().await.unwrap();

        keys(&converter, "1 2 +");
        assert!(converter.focus(&CurrencyCode::eur()));
        keys(&converter, "5");

        let snapshot = converter.snapshot();
        assert_eq!(snapshot.active, Some(CurrencyCode::eur()));
        assert_eq!(snapshot.amount(&CurrencyCode::eur()), Some("5"));
        assert!(!converter.focus(&CurrencyCode::jpy()));
    }

    #[tokio::test]
    async fn test_selection_edits_persist_and_reset() {
        let (_source, store, converter) = setup(&["TWD", "USD"]);
        converter.load().await.unwrap();
        converter.on_amount_edited(&CurrencyCode::usd(), "1");

        converter.add_currency(CurrencyCode::krw()).unwrap();

        assert_eq!(store.selected_currencies().codes(), codes(&["TWD", "USD", "KRW"]).as_slice());
        let snapshot = converter.snapshot();
        assert_eq!(snapshot.active, Some(CurrencyCode::twd()));
        assert_eq!(snapshot.amount(&CurrencyCode::twd()), Some("100"));
        assert_eq!(snapshot.amount(&CurrencyCode::usd()), Some("3.13"));
        assert_eq!(snapshot.amount(&CurrencyCode::krw()), Some("4062.50"));

        let old = converter.replace_currency(1, CurrencyCode::jpy()).unwrap();
        assert_eq!(old, CurrencyCode::usd());
        assert_eq!(converter.toggle_currency(CurrencyCode::krw()).unwrap(), Toggled::Removed);
        assert_eq!(converter.selection().codes(), codes(&["TWD", "JPY"]).as_slice());
        assert_eq!(store.selected_currencies(), converter.selection());
    }

    #[tokio::test]
    async fn test_rejected_selection_edit_changes_nothing() {
        let (_source, store, converter) = setup(&["TWD", "USD"]);
        converter.load().await.unwrap();
        converter.on_amount_edited(&CurrencyCode::usd(), "1");
        let before = converter.snapshot();

        let result = converter.remove_currency(&CurrencyCode::twd());

        assert!(matches!(
            result,
            Err(ConverterError::Selection(SelectionError::HomeCurrency(_)))
        ));
        assert_eq!(converter.snapshot().rows, before.rows);
        assert_eq!(store.selected_currencies().len(), 2);
    }

    #[tokio::test]
    async fn test_update_settings() {
        let (_source, store, converter) = setup(&["USD", "JPY"]);
        converter.load().await.unwrap();

        let settings = converter
            .update_settings(SettingsPatch {
                decimal_places: Some(0),
                ..SettingsPatch::default()
            })
            .unwrap();

        assert_eq!(settings.decimal_places, 0);
        assert_eq!(store.settings().decimal_places, 0);
        assert_eq!(converter.snapshot().amount(&CurrencyCode::jpy()), Some("15000"));

        let invalid = converter.update_settings(SettingsPatch {
            decimal_places: Some(12),
            ..SettingsPatch::default()
        });
        assert!(matches!(invalid, Err(ConverterError::InvalidSettings(_))));
        assert_eq!(converter.settings().decimal_places, 0);
    }

    #[tokio::test]
    async fn test_custom_home_flag() {
        let (_source, _store, converter) = setup(&["TWD", "USD"]);
        converter.load().await.unwrap();
        assert_eq!(converter.snapshot().rows[0].descriptor.flag, "🇹🇼");

        converter
            .update_settings(SettingsPatch {
                custom_home_flag: Some(Some("🏝️".to_string())),
                ..SettingsPatch::default()
            })
            .unwrap();

        let snapshot = converter.snapshot();
        assert_eq!(snapshot.rows[0].descriptor.flag, "🏝️");
        assert_eq!(snapshot.rows[1].descriptor.flag, "🇺🇸");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ConverterConfig::default();
        config.base_currency = "??".to_string();

        let result = Converter::with_source(
            config,
            Arc::new(MockRateSource::new("mock")),
            Arc::new(MemorySettingsStore::new()),
        );
        assert!(matches!(result, Err(ConverterError::Config(_))));
    }
}
