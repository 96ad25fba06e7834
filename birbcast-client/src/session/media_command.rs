use tokio::sync::oneshot;

/// Команды, поступающие в контроллер медиасессии от координатора.
#[derive(Debug)]
pub enum MediaCommand {
    /// Снести текущую сессию (если есть) и начать новое согласование.
    Start,

    /// Освободить транспорт и вернуться в IDLE.
    Stop,

    /// Финальное закрытие: CLOSED, после чего цикл завершается.
    Shutdown { done: oneshot::Sender<()> },
}
