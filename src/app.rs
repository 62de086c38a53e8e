use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Frame;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthError, AuthProvider, LocalAuthProvider, SessionContext};
use crate::config::Config;
use crate::form::{PendingSubmission, SubmitError};
use crate::gateway::Gateway;
use crate::services::{DepartmentService, EmployeeService};
use crate::store::{open_store, DocumentStore};
use crate::types::{Department, Employee, EmployeeStatus};
use crate::ui::{
    Dashboard, DashboardAction, DashboardStats, DepartmentFormAction, DepartmentFormScreen,
    DepartmentListAction, DepartmentListScreen, EmployeeListAction, EmployeeListScreen,
    EmployeeWizard, LoginAction, LoginMode, LoginScreen, ManagerOption, MemberOption, MenuItem,
    TerminalGuard, WizardAction,
};

/// The view currently owning the keyboard
enum Screen {
    Login(LoginScreen),
    Dashboard(Dashboard),
    Employees(EmployeeListScreen),
    Wizard(EmployeeWizard),
    Departments(DepartmentListScreen),
    DepartmentForm(DepartmentFormScreen),
}

/// What a screen asked for, applied once the screen borrow is released
enum ScreenAction {
    Login(LoginAction),
    Dashboard(DashboardAction),
    Employees(EmployeeListAction),
    Wizard(WizardAction),
    Departments(DepartmentListAction),
    DepartmentForm(DepartmentFormAction),
    /// A validated employee waiting for the gateway
    SaveEmployee(PendingSubmission<Employee>),
    SaveDepartment(PendingSubmission<Department>),
}

impl ScreenAction {
    /// True when applying the action blocks on the backend
    fn waits_on_backend(&self) -> bool {
        matches!(
            self,
            ScreenAction::Login(LoginAction::Submit { .. })
                | ScreenAction::SaveEmployee(_)
                | ScreenAction::SaveDepartment(_)
        )
    }
}

pub struct App {
    config: Config,
    session: SessionContext,
    employees: EmployeeService,
    departments: DepartmentService,
    screen: Screen,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let store = open_store(&config);
        let provider = Arc::new(LocalAuthProvider::new(
            config.users_path(),
            config.auth.clone(),
        ));
        Ok(Self::with_backend(config, store, provider))
    }

    /// Build the app over an explicit store and auth provider
    pub fn with_backend(
        config: Config,
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn AuthProvider>,
    ) -> Self {
        let session = SessionContext::init(provider);
        let screen = match session.current_user() {
            Some(user) => Screen::Dashboard(Dashboard::new(&user.email)),
            None => Screen::Login(LoginScreen::new()),
        };
        Self {
            config,
            session,
            employees: EmployeeService::new(Arc::clone(&store)),
            departments: DepartmentService::new(store),
            screen,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut guard = TerminalGuard::enter()?;
        let tick_rate = Duration::from_millis(self.config.ui.tick_rate_ms);

        self.refresh_dashboard().await;

        while !self.should_quit {
            guard.terminal().draw(|f| self.render(f))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if let Some(action) = self.dispatch_key(key.code) {
                            // Put the busy state on screen before blocking
                            if action.waits_on_backend() {
                                guard.terminal().draw(|f| self.render(f))?;
                            }
                            self.apply(action).await;
                        }
                    }
                }
            }

            // Sign-outs from elsewhere end the session here too
            if self.session.refresh() && !self.session.is_authenticated() {
                self.show_login(None);
            }
        }

        guard.restore();
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        match &mut self.screen {
            Screen::Login(login) => login.render(frame),
            Screen::Dashboard(dashboard) => dashboard.render(frame),
            Screen::Employees(list) => list.render(frame),
            Screen::Wizard(wizard) => wizard.render(frame),
            Screen::Departments(list) => list.render(frame),
            Screen::DepartmentForm(form) => form.render(frame),
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn handle_key(&mut self, key: KeyCode) -> Result<()> {
        if let Some(action) = self.dispatch_key(key) {
            self.apply(action).await;
        }
        Ok(())
    }

    /// Route a key to the active screen. Backend work is left to `apply`.
    fn dispatch_key(&mut self, key: KeyCode) -> Option<ScreenAction> {
        if !matches!(self.screen, Screen::Login(_)) {
            if let Err(e) = self.session.require_session().map(|_| ()) {
                self.show_login(Some(e));
                return None;
            }
        }

        let action = match &mut self.screen {
            Screen::Login(s) => ScreenAction::Login(s.handle_key(key)),
            Screen::Dashboard(s) => ScreenAction::Dashboard(s.handle_key(key)),
            Screen::Employees(s) => ScreenAction::Employees(s.handle_key(key)),
            Screen::Wizard(s) => ScreenAction::Wizard(s.handle_key(key)),
            Screen::Departments(s) => ScreenAction::Departments(s.handle_key(key)),
            Screen::DepartmentForm(s) => ScreenAction::DepartmentForm(s.handle_key(key)),
        };
        Some(self.prepare(action))
    }

    /// Enter the busy state for actions that wait on the backend.
    /// Form submissions are validated here and become pending saves.
    fn prepare(&mut self, action: ScreenAction) -> ScreenAction {
        match (action, &mut self.screen) {
            (action @ ScreenAction::Login(LoginAction::Submit { .. }), Screen::Login(login)) => {
                login.busy = true;
                action
            }
            (ScreenAction::Wizard(WizardAction::Submit), Screen::Wizard(wizard)) => {
                match wizard.form_mut().begin_submit() {
                    Ok(pending) => ScreenAction::SaveEmployee(pending),
                    Err(e) => {
                        tracing::debug!(error = %e, "employee submission not started");
                        wizard.after_submit(&Err(e));
                        ScreenAction::Wizard(WizardAction::None)
                    }
                }
            }
            (
                ScreenAction::DepartmentForm(DepartmentFormAction::Submit),
                Screen::DepartmentForm(form),
            ) => match form.form_mut().begin_submit() {
                Ok(pending) => ScreenAction::SaveDepartment(pending),
                Err(e) => {
                    tracing::debug!(error = %e, "department submission not started");
                    form.after_submit(&Err(e));
                    ScreenAction::DepartmentForm(DepartmentFormAction::None)
                }
            },
            (action, _) => action,
        }
    }

    async fn apply(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::Login(action) => self.on_login(action).await,
            ScreenAction::Dashboard(action) => self.on_dashboard(action).await,
            ScreenAction::Employees(action) => self.on_employee_list(action).await,
            ScreenAction::Wizard(action) => self.on_wizard(action).await,
            ScreenAction::Departments(action) => self.on_department_list(action).await,
            ScreenAction::DepartmentForm(action) => self.on_department_form(action).await,
            ScreenAction::SaveEmployee(pending) => self.save_employee(pending).await,
            ScreenAction::SaveDepartment(pending) => self.save_department(pending).await,
        }
    }

    // ─── Session ─────────────────────────────────────────────────────────────

    fn show_login(&mut self, reason: Option<AuthError>) {
        let mut login = LoginScreen::new();
        if let Some(reason) = reason {
            login.set_error(reason.user_message());
        }
        self.screen = Screen::Login(login);
    }

    async fn on_login(&mut self, action: LoginAction) {
        let (mode, email, password) = match action {
            LoginAction::None => return,
            LoginAction::Quit => {
                self.should_quit = true;
                return;
            }
            LoginAction::Submit {
                mode,
                email,
                password,
            } => (mode, email, password),
        };

        let result = match mode {
            LoginMode::SignIn => self.session.sign_in(&email, &password).await,
            LoginMode::Register => self.register(&email, &password).await,
        };

        match result {
            Ok(()) => {
                tracing::info!(email = %email, "signed in");
                self.show_dashboard().await;
            }
            Err(e) => {
                tracing::warn!(code = e.code(), "sign-in failed");
                if let Screen::Login(login) = &mut self.screen {
                    login.busy = false;
                    login.set_error(e.user_message());
                    login.reset_password();
                }
            }
        }
    }

    async fn register(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        self.session.provider().register(email, password).await?;
        self.session.refresh();
        Ok(())
    }

    // ─── Dashboard ───────────────────────────────────────────────────────────

    async fn show_dashboard(&mut self) {
        let email = self
            .session
            .current_user()
            .map(|u| u.email.clone())
            .unwrap_or_default();
        self.screen = Screen::Dashboard(Dashboard::new(email));
        self.refresh_dashboard().await;
    }

    async fn refresh_dashboard(&mut self) {
        let Screen::Dashboard(_) = self.screen else {
            return;
        };
        let stats = match (self.employees.list().await, self.departments.list().await) {
            (Ok(employees), Ok(departments)) => Ok(DashboardStats {
                employees: employees.len(),
                active_employees: employees
                    .iter()
                    .filter(|e| e.status == EmployeeStatus::Active)
                    .count(),
                departments: departments.len(),
            }),
            (Err(e), _) | (_, Err(e)) => Err(e),
        };
        if let Screen::Dashboard(dashboard) = &mut self.screen {
            match stats {
                Ok(stats) => dashboard.stats = stats,
                Err(e) => dashboard.status = Some(e.user_message()),
            }
        }
    }

    async fn on_dashboard(&mut self, action: DashboardAction) {
        match action {
            DashboardAction::None => {}
            DashboardAction::Quit => self.should_quit = true,
            DashboardAction::Open(MenuItem::Employees) => self.show_employees(None).await,
            DashboardAction::Open(MenuItem::RegisterEmployee) => self.show_wizard(None).await,
            DashboardAction::Open(MenuItem::Departments) => self.show_departments(None).await,
            DashboardAction::Open(MenuItem::NewDepartment) => {
                self.show_department_form(None).await
            }
            DashboardAction::Open(MenuItem::SignOut) => {
                if let Err(e) = self.session.sign_out().await {
                    tracing::warn!(error = %e, "sign-out failed");
                }
                self.show_login(None);
            }
        }
    }

    // ─── Employees ───────────────────────────────────────────────────────────

    async fn show_employees(&mut self, message: Option<String>) {
        let mut list = EmployeeListScreen::new();
        match self.employees.list().await {
            Ok(employees) => list.set_employees(employees),
            Err(e) => {
                list.loading = false;
                list.message = Some(e.user_message());
            }
        }
        if message.is_some() {
            list.message = message;
        }
        self.screen = Screen::Employees(list);
    }

    async fn on_employee_list(&mut self, action: EmployeeListAction) {
        match action {
            EmployeeListAction::None => {}
            EmployeeListAction::Back => self.show_dashboard().await,
            EmployeeListAction::Refresh => self.show_employees(None).await,
            EmployeeListAction::New => self.show_wizard(None).await,
            EmployeeListAction::Edit(id) => match self.employees.get(&id).await {
                Ok(Some(employee)) => self.show_wizard(Some(employee)).await,
                Ok(None) => {
                    self.show_employees(Some("Employee no longer exists".to_string()))
                        .await
                }
                Err(e) => self.show_employees(Some(e.user_message())).await,
            },
            EmployeeListAction::ToggleStatus { id, status } => {
                let message = match self.employees.set_status(&id, status).await {
                    Ok(()) => format!("Status changed to {}", status.as_str()),
                    Err(e) => e.user_message(),
                };
                self.show_employees(Some(message)).await;
            }
            EmployeeListAction::Delete(id) => {
                let message = match self.employees.delete(&id).await {
                    Ok(()) => "Employee deleted".to_string(),
                    Err(e) => e.user_message(),
                };
                self.show_employees(Some(message)).await;
            }
        }
    }

    async fn manager_options(&self, exclude: Option<&str>) -> Vec<ManagerOption> {
        match self.employees.managers().await {
            Ok(managers) => managers
                .iter()
                .filter(|m| m.id.as_deref() != exclude)
                .filter_map(ManagerOption::from_employee)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not load managers");
                Vec::new()
            }
        }
    }

    async fn show_wizard(&mut self, employee: Option<Employee>) {
        let wizard = match employee {
            Some(employee) => {
                let managers = self.manager_options(employee.id.as_deref()).await;
                EmployeeWizard::edit(employee, managers)
            }
            None => EmployeeWizard::new(self.manager_options(None).await),
        };
        self.screen = Screen::Wizard(wizard);
    }

    async fn on_wizard(&mut self, action: WizardAction) {
        match action {
            // Submit was turned into a pending save by `prepare`
            WizardAction::None | WizardAction::Submit => {}
            WizardAction::Cancel | WizardAction::Close => self.show_employees(None).await,
        }
    }

    async fn save_employee(&mut self, pending: PendingSubmission<Employee>) {
        let result = pending.send(&self.employees).await;
        if let Screen::Wizard(wizard) = &mut self.screen {
            wizard.form_mut().complete_submission(result.clone());
            wizard.after_submit(&result.map_err(SubmitError::from));
        }
    }

    // ─── Departments ─────────────────────────────────────────────────────────

    async fn show_departments(&mut self, message: Option<String>) {
        let mut list = DepartmentListScreen::new();
        match self.departments.list_with_details().await {
            Ok(departments) => list.set_departments(departments),
            Err(e) => {
                list.loading = false;
                list.message = Some(e.user_message());
            }
        }
        if message.is_some() {
            list.message = message;
        }
        self.screen = Screen::Departments(list);
    }

    async fn on_department_list(&mut self, action: DepartmentListAction) {
        match action {
            DepartmentListAction::None => {}
            DepartmentListAction::Back => self.show_dashboard().await,
            DepartmentListAction::Refresh => self.show_departments(None).await,
            DepartmentListAction::New => self.show_department_form(None).await,
            DepartmentListAction::Edit(id) => match self.departments.get(&id).await {
                Ok(Some(department)) => {
                    self.show_department_form(Some(department)).await
                }
                Ok(None) => {
                    self.show_departments(Some("Department no longer exists".to_string()))
                        .await
                }
                Err(e) => self.show_departments(Some(e.user_message())).await,
            },
            DepartmentListAction::Delete(ids) => {
                let report = self.departments.delete_many(&ids).await;
                for (id, error) in &report.failed {
                    tracing::warn!(id = %id, error = %error, "department delete failed");
                }
                self.show_departments(Some(report.summary())).await;
            }
        }
    }

    async fn show_department_form(&mut self, department: Option<Department>) {
        let managers = match self.departments.available_managers().await {
            Ok(managers) => managers
                .iter()
                .filter_map(ManagerOption::from_employee)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not load managers");
                Vec::new()
            }
        };
        let members = match self.employees.list().await {
            Ok(employees) => employees
                .iter()
                .filter_map(MemberOption::from_employee)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not load employees");
                Vec::new()
            }
        };
        let form = match department {
            Some(department) => DepartmentFormScreen::edit(department, managers, members),
            None => DepartmentFormScreen::new(managers, members),
        };
        self.screen = Screen::DepartmentForm(form);
    }

    async fn on_department_form(&mut self, action: DepartmentFormAction) {
        match action {
            DepartmentFormAction::None | DepartmentFormAction::Submit => {}
            DepartmentFormAction::Cancel | DepartmentFormAction::Close => {
                self.show_departments(None).await
            }
        }
    }

    async fn save_department(&mut self, pending: PendingSubmission<Department>) {
        let result = pending.send(&self.departments).await;
        if let Screen::DepartmentForm(form) = &mut self.screen {
            form.form_mut().complete_submission(result.clone());
            form.after_submit(&result.map_err(SubmitError::from));
        }
    }

    /// Stop following the session; called once the UI has exited
    pub fn shutdown(self) {
        self.session.teardown();
    }
}
