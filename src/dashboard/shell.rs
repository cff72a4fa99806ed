use eframe::egui;

/// Header / content / footer chrome shared by dashboard widgets.
pub struct WidgetShell<'a> {
    title: &'a str,
    icon: &'a str,
    total_count: Option<usize>,
    refresh_label: Option<&'a str>,
    view_all: Option<(&'a str, &'a str)>,
}

pub struct ShellResponse<R> {
    pub inner: R,
    pub refresh_clicked: bool,
}

impl<'a> WidgetShell<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            icon: "",
            total_count: None,
            refresh_label: None,
            view_all: None,
        }
    }

    pub fn icon(mut self, icon: &'a str) -> Self {
        self.icon = icon;
        self
    }

    pub fn total_count(mut self, count: usize) -> Self {
        self.total_count = Some(count);
        self
    }

    pub fn refresh_button(mut self, label: &'a str) -> Self {
        self.refresh_label = Some(label);
        self
    }

    /// Footer link. Hidden when `url` is empty.
    pub fn view_all(mut self, url: &'a str, label: &'a str) -> Self {
        if !url.trim().is_empty() {
            self.view_all = Some((url, label));
        }
        self
    }

    pub fn show<R>(
        self,
        ui: &mut egui::Ui,
        content: impl FnOnce(&mut egui::Ui) -> R,
    ) -> ShellResponse<R> {
        let mut refresh_clicked = false;
        ui.horizontal(|ui| {
            if !self.icon.is_empty() {
                ui.label(self.icon);
            }
            ui.heading(self.title);
            if let Some(count) = self.total_count {
                ui.label(egui::RichText::new(format!("({count})")).weak());
            }
            if let Some(label) = self.refresh_label {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    refresh_clicked = ui.small_button(label).clicked();
                });
            }
        });
        ui.separator();
        let inner = content(ui);
        if let Some((url, label)) = self.view_all {
            ui.separator();
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.hyperlink_to(label, url);
            });
        }
        ShellResponse {
            inner,
            refresh_clicked,
        }
    }
}
