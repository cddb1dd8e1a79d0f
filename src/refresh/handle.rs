// ============================================================================
// Moteur de rafraîchissement : RefreshHandle
// ============================================================================
// Une tâche tokio par flux de données (marché, détail, recherche, news).
// Elle possède les paramètres courants, lance les fetchs et publie l'état
// sur un canal watch que l'interface lit sans jamais bloquer.
//
// Déclencheurs d'un fetch :
// - démarrage (immédiat, ou après le debounce)
// - changement de paramètres (le fetch en cours est abandonné)
// - tick de polling (ignoré si un fetch est déjà en cours)
// - retry explicite
//
// CONCEPTS RUST :
// 1. tokio::select! : attendre plusieurs sources d'événements à la fois
// 2. watch::channel : dernière valeur publiée, lecture non bloquante
// 3. Numéro de séquence : un résultat dépassé n'est jamais appliqué
// 4. Drop : détruire le handle arrête la tâche et son fetch en cours
// ============================================================================

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::refresh::RefreshState;

/// Fournisseur de données pour une tâche de rafraîchissement
///
/// CONCEPT RUST : types associés
/// - Chaque flux a ses propres paramètres et son propre résultat
/// - Le moteur reste générique et ne connaît aucun des deux
pub trait Refresher: Send + Sync + 'static {
    type Params: Clone + Debug + PartialEq + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    /// Nom du flux dans les logs
    fn name(&self) -> &'static str;

    /// Résultat connu sans fetch (ex : recherche vide)
    fn immediate(&self, _params: &Self::Params) -> Option<Self::Output> {
        None
    }

    fn fetch(
        &self,
        params: Self::Params,
    ) -> impl Future<Output = Result<Self::Output, FetchError>> + Send;
}

/// Quand déclencher les fetchs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Re-fetch périodique avec les derniers paramètres
    pub poll_every: Option<Duration>,
    /// Délai de silence avant d'appliquer un changement de paramètres
    pub debounce: Option<Duration>,
}

impl RefreshPolicy {
    /// Un fetch par jeu de paramètres
    pub fn once() -> Self {
        Self::default()
    }

    pub fn polling(every: Duration) -> Self {
        Self {
            poll_every: Some(every),
            debounce: None,
        }
    }

    pub fn debounced(delay: Duration) -> Self {
        Self {
            poll_every: None,
            debounce: Some(delay),
        }
    }
}

/// Commandes envoyées à la tâche
#[derive(Debug)]
enum Command<P> {
    SetParams(P),
    Retry,
}

/// Handle vers une tâche de rafraîchissement
///
/// La tâche vit aussi longtemps que le handle.
pub struct RefreshHandle<R: Refresher> {
    name: &'static str,
    params: R::Params,
    commands: mpsc::UnboundedSender<Command<R::Params>>,
    state: watch::Receiver<RefreshState<R::Output>>,
    task: JoinHandle<()>,
}

impl<R: Refresher> RefreshHandle<R> {
    /// Démarre la tâche
    ///
    /// Doit être appelé dans le contexte d'un runtime tokio.
    pub fn spawn(refresher: R, policy: RefreshPolicy, params: R::Params) -> Self {
        let name = refresher.name();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(RefreshState::default());
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        info!(feed = name, ?policy, ?params, "Starting refresh task");

        let worker = Worker {
            refresher: Arc::new(refresher),
            policy,
            params: params.clone(),
            state: state_tx,
            results: result_tx,
            issued: 0,
            awaiting: None,
            in_flight: None,
        };
        let task = tokio::spawn(worker.run(command_rx, result_rx));

        Self {
            name,
            params,
            commands,
            state,
            task,
        }
    }

    /// Paramètres courants (tels que demandés par l'interface)
    pub fn params(&self) -> &R::Params {
        &self.params
    }

    /// Change les paramètres
    ///
    /// Sans effet si les paramètres sont identiques aux courants.
    pub fn set_params(&mut self, params: R::Params) {
        if params == self.params {
            return;
        }
        debug!(feed = self.name, ?params, "Parameters changed");
        self.params = params.clone();
        self.send(Command::SetParams(params));
    }

    /// Relance immédiatement un fetch avec les paramètres courants
    pub fn retry(&self) {
        debug!(feed = self.name, "Retry requested");
        self.send(Command::Retry);
    }

    /// Copie de l'état publié
    pub fn state(&self) -> RefreshState<R::Output> {
        self.state.borrow().clone()
    }

    /// Attend la prochaine publication
    ///
    /// Retourne false si la tâche est terminée.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    /// Récepteur indépendant (pour attendre sans emprunter le handle)
    pub fn subscribe(&self) -> watch::Receiver<RefreshState<R::Output>> {
        self.state.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Arrête la tâche (équivalent à drop)
    pub fn shutdown(self) {}

    fn send(&self, command: Command<R::Params>) {
        if self.commands.send(command).is_err() {
            warn!(feed = self.name, "Refresh task is gone, command dropped");
        }
    }
}

impl<R: Refresher> Drop for RefreshHandle<R> {
    fn drop(&mut self) {
        debug!(feed = self.name, "Stopping refresh task");
        self.task.abort();
    }
}

// ============================================================================
// Tâche de fond
// ============================================================================

type FetchResult<T> = (u64, Result<T, FetchError>);

struct Worker<R: Refresher> {
    refresher: Arc<R>,
    policy: RefreshPolicy,
    params: R::Params,
    state: watch::Sender<RefreshState<R::Output>>,
    results: mpsc::UnboundedSender<FetchResult<R::Output>>,
    /// Dernier numéro de séquence attribué
    issued: u64,
    /// Séquence dont le résultat est attendu (None : aucun)
    awaiting: Option<u64>,
    in_flight: Option<JoinHandle<()>>,
}

impl<R: Refresher> Worker<R> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command<R::Params>>,
        mut results: mpsc::UnboundedReceiver<FetchResult<R::Output>>,
    ) {
        let mut ticker = self.policy.poll_every.map(|every| {
            let mut interval = tokio::time::interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        // Premier fetch : immédiat, ou après le debounce
        let mut deadline = match self.policy.debounce {
            Some(delay) => Some(Instant::now() + delay),
            None => {
                self.start_fetch();
                None
            }
        };

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::SetParams(params)) => {
                        self.params = params;
                        self.cancel_in_flight();
                        match self.policy.debounce {
                            Some(delay) => deadline = Some(Instant::now() + delay),
                            None => self.start_fetch(),
                        }
                        if let Some(interval) = ticker.as_mut() {
                            interval.reset();
                        }
                    }
                    Some(Command::Retry) => {
                        deadline = None;
                        self.start_fetch();
                    }
                    // Handle détruit
                    None => break,
                },

                Some((sequence, result)) = results.recv() => {
                    self.apply(sequence, result);
                }

                _ = sleep_until(deadline) => {
                    deadline = None;
                    self.start_fetch();
                }

                _ = tick(&mut ticker) => {
                    if self.awaiting.is_some() {
                        debug!(feed = self.refresher.name(), "Poll tick skipped, fetch in flight");
                    } else {
                        self.start_fetch();
                    }
                }
            }
        }

        debug!(feed = self.refresher.name(), "Refresh task stopped");
    }

    /// Lance un fetch avec les paramètres courants
    fn start_fetch(&mut self) {
        self.cancel_in_flight();

        if let Some(output) = self.refresher.immediate(&self.params) {
            debug!(feed = self.refresher.name(), "Settled without fetching");
            self.state.send_modify(|state| state.settle(output));
            return;
        }

        self.issued += 1;
        let sequence = self.issued;
        self.awaiting = Some(sequence);
        self.state.send_modify(|state| state.begin());

        debug!(feed = self.refresher.name(), sequence, params = ?self.params, "Fetching");

        let refresher = Arc::clone(&self.refresher);
        let params = self.params.clone();
        let results = self.results.clone();

        self.in_flight = Some(tokio::spawn(async move {
            let result = refresher.fetch(params).await;
            // La tâche principale peut être terminée entre-temps
            let _ = results.send((sequence, result));
        }));
    }

    /// Applique un résultat s'il correspond au dernier fetch lancé
    fn apply(&mut self, sequence: u64, result: Result<R::Output, FetchError>) {
        if self.awaiting != Some(sequence) {
            debug!(
                feed = self.refresher.name(),
                sequence,
                latest = self.issued,
                "Discarding stale result"
            );
            return;
        }
        self.awaiting = None;
        self.in_flight = None;

        match &result {
            Ok(_) => debug!(feed = self.refresher.name(), sequence, "Fetch succeeded"),
            Err(err) => warn!(
                feed = self.refresher.name(),
                sequence,
                kind = err.kind(),
                error = %err,
                "Fetch failed"
            ),
        }

        self.state.send_modify(|state| state.finish(sequence, result));
    }

    /// Abandonne le fetch en cours, son résultat ne sera pas appliqué
    fn cancel_in_flight(&mut self) {
        self.awaiting = None;
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

impl<R: Refresher> Drop for Worker<R> {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

/// Attend l'échéance du debounce, ou indéfiniment s'il n'y en a pas
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Prochain tick de polling, ou jamais sans polling
async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
// CONCEPT RUST : #[tokio::test(start_paused = true)]
// - Horloge tokio figée, avancée automatiquement quand tout est en attente
// - Les délais de plusieurs secondes s'exécutent instantanément
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Fournisseur de test : attend `params` millisecondes, renvoie params × 10
    #[derive(Clone, Default)]
    struct Scripted {
        calls: Arc<Mutex<Vec<u64>>>,
        failing: Arc<AtomicBool>,
    }

    impl Scripted {
        fn calls(&self) -> Vec<u64> {
            self.calls.lock().unwrap().clone()
        }

        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    impl Refresher for Scripted {
        type Params = u64;
        type Output = u64;

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn immediate(&self, params: &u64) -> Option<u64> {
            (*params == 0).then_some(0)
        }

        async fn fetch(&self, params: u64) -> Result<u64, FetchError> {
            self.calls.lock().unwrap().push(params);
            tokio::time::sleep(Duration::from_millis(params)).await;
            if self.failing.load(Ordering::SeqCst) {
                Err(FetchError::NetworkUnavailable("offline".into()))
            } else {
                Ok(params * 10)
            }
        }
    }

    /// Attend un état satisfaisant le prédicat
    async fn wait_for(
        rx: &mut watch::Receiver<RefreshState<u64>>,
        pred: impl Fn(&RefreshState<u64>) -> bool,
    ) -> RefreshState<u64> {
        tokio::time::timeout(Duration::from_secs(3600), async {
            loop {
                {
                    let state = rx.borrow_and_update();
                    if pred(&*state) {
                        return (*state).clone();
                    }
                }
                rx.changed().await.expect("refresh task stopped");
            }
        })
        .await
        .expect("state never reached")
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fetch_publishes_data() {
        let scripted = Scripted::default();
        let handle = RefreshHandle::spawn(scripted.clone(), RefreshPolicy::once(), 5);
        let mut rx = handle.subscribe();

        let state = wait_for(&mut rx, |s| s.data.is_some()).await;
        assert_eq!(state.data, Some(50));
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.sequence, 1);
        assert_eq!(scripted.calls(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_keeps_stale_data_and_retry_recovers() {
        let scripted = Scripted::default();
        let mut handle = RefreshHandle::spawn(scripted.clone(), RefreshPolicy::once(), 5);
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.data == Some(50)).await;

        scripted.fail(true);
        handle.set_params(7);
        let state = wait_for(&mut rx, |s| s.error.is_some()).await;
        assert_eq!(state.data, Some(50));
        assert!(!state.loading);

        scripted.fail(false);
        handle.retry();
        let state = wait_for(&mut rx, |s| s.data == Some(70)).await;
        assert!(state.error.is_none());
        assert_eq!(scripted.calls(), vec![5, 7, 7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_parameters_win() {
        let scripted = Scripted::default();
        let mut handle = RefreshHandle::spawn(scripted.clone(), RefreshPolicy::once(), 1000);
        let mut rx = handle.subscribe();

        // Laisse démarrer le fetch lent
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.set_params(20);

        let state = wait_for(&mut rx, |s| s.data.is_some()).await;
        assert_eq!(state.data, Some(200));

        // Le fetch lent ne doit jamais écraser le résultat
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.state().data, Some(200));
        assert_eq!(scripted.calls(), vec![1000, 20]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_collapses_rapid_changes() {
        let scripted = Scripted::default();
        let mut handle = RefreshHandle::spawn(
            scripted.clone(),
            RefreshPolicy::debounced(Duration::from_millis(300)),
            1,
        );
        let mut rx = handle.subscribe();

        handle.set_params(2);
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.set_params(3);
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.set_params(4);

        let state = wait_for(&mut rx, |s| s.data.is_some()).await;
        assert_eq!(state.data, Some(40));
        assert_eq!(scripted.calls(), vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_result_skips_fetch() {
        let scripted = Scripted::default();
        let mut handle = RefreshHandle::spawn(scripted.clone(), RefreshPolicy::once(), 3);
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.data == Some(30)).await;

        handle.set_params(0);
        let state = wait_for(&mut rx, |s| s.data == Some(0)).await;
        assert!(!state.loading);
        assert_eq!(scripted.calls(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_refetches_with_current_params() {
        let scripted = Scripted::default();
        let handle = RefreshHandle::spawn(
            scripted.clone(),
            RefreshPolicy::polling(Duration::from_secs(60)),
            5,
        );

        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(scripted.calls(), vec![5, 5, 5]);
        assert!(handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_same_params_is_noop() {
        let scripted = Scripted::default();
        let mut handle = RefreshHandle::spawn(scripted.clone(), RefreshPolicy::once(), 5);
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.data.is_some()).await;

        handle.set_params(5);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(scripted.calls(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_task() {
        let scripted = Scripted::default();
        let handle = RefreshHandle::spawn(
            scripted.clone(),
            RefreshPolicy::polling(Duration::from_secs(60)),
            500,
        );
        let mut rx = handle.subscribe();

        tokio::time::sleep(Duration::from_millis(10)).await;
        rx.borrow_and_update();
        drop(handle);

        // Plus aucune publication, plus aucun fetch
        assert!(rx.changed().await.is_err());
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(scripted.calls(), vec![500]);
        assert!(rx.borrow().data.is_none());
    }
}
