//! bevy ui for the widget: node tree, input handling, and presentation
//! derived from `ChatWidget` state.

use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::prelude::*;

use crate::config::WidgetConfig;
use crate::format::Fragment;
use crate::log::{Body, LogEntry};
use crate::message::{Sender, meta_label};
use crate::panel::PanelState;
use crate::widget::ChatWidget;
use crate::{HistoryRequest, submit_input};

const PANEL_BG: Color = Color::srgb(0.12, 0.13, 0.16);
const BTN_BG: Color = Color::srgb(0.2, 0.2, 0.25);
const BTN_HOVER: Color = Color::srgb(0.25, 0.25, 0.3);
const BTN_PRESSED: Color = Color::srgb(0.3, 0.3, 0.35);
const BTN_DISABLED: Color = Color::srgb(0.15, 0.15, 0.17);
const TOGGLE_BG: Color = Color::srgb(0.10, 0.45, 0.55);
const USER_BG: Color = Color::srgb(0.15, 0.40, 0.70);
const ASSISTANT_BG: Color = Color::srgb(0.25, 0.27, 0.31);
const TEXT: Color = Color::srgb(0.95, 0.95, 0.96);
const LINK: Color = Color::srgb(0.18, 0.83, 0.75);
const META: Color = Color::srgb(0.75, 0.77, 0.80);

/// points a widget part at its `ChatWidget` entity.
#[derive(Component, Copy, Clone, Debug)]
pub struct TargetWidget(pub Entity);

#[derive(Component)]
pub struct PanelNode;
#[derive(Component)]
pub struct ToggleButton;
#[derive(Component)]
pub struct CloseButton;
#[derive(Component)]
pub struct ExpandButton;
#[derive(Component)]
pub struct ExpandLabel;
#[derive(Component)]
pub struct SendButton;
#[derive(Component)]
pub struct SendLabel;
#[derive(Component)]
pub struct TypingIndicator;
#[derive(Component)]
pub struct InputText;

/// scrollable message log; `shown` counts entries already spawned.
#[derive(Component, Default)]
pub struct LogNode {
    pub shown: usize,
    font: Handle<Font>,
}

/// spawn a widget (closed) with its node tree and queue its history load.
pub fn spawn_chat_widget(commands: &mut Commands, config: WidgetConfig, font: Handle<Font>) -> Entity {
    let title = config.title.clone();
    let text_16 = TextFont { font: font.clone(), font_size: 16.0, ..default() };
    let text_14 = TextFont { font: font.clone(), font_size: 14.0, ..default() };

    let root = commands
        .spawn((
            ChatWidget::new(config),
            HistoryRequest,
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(32.0),
                bottom: Val::Px(32.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::FlexEnd,
                row_gap: Val::Px(12.0),
                ..default()
            },
        ))
        .id();
    info!(target: "bevy_chat_widget", "spawn_chat_widget: entity={:?}", root);

    commands.entity(root).with_children(|p| {
        // --- panel ---
        p.spawn((
            PanelNode,
            TargetWidget(root),
            Interaction::None,
            Node {
                display: Display::None,
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(8.0),
                padding: UiRect::all(Val::Px(12.0)),
                ..default()
            },
            BackgroundColor(PANEL_BG),
        ))
        .with_children(|panel| {
            // header: title, [expand] [close]
            panel
                .spawn(Node {
                    width: Val::Percent(100.0),
                    flex_direction: FlexDirection::Row,
                    justify_content: JustifyContent::SpaceBetween,
                    align_items: AlignItems::Center,
                    ..default()
                })
                .with_children(|h| {
                    h.spawn((Text::new(title), text_16.clone(), TextColor(TEXT)));
                    h.spawn(Node {
                        flex_direction: FlexDirection::Row,
                        column_gap: Val::Px(6.0),
                        ..default()
                    })
                    .with_children(|b| {
                        b.spawn((Button, ExpandButton, TargetWidget(root), button_node(72.0), BackgroundColor(BTN_BG)))
                            .with_children(|l| {
                                l.spawn((
                                    Text::new("expand"),
                                    text_14.clone(),
                                    TextColor(TEXT),
                                    ExpandLabel,
                                    TargetWidget(root),
                                ));
                            });
                        b.spawn((Button, CloseButton, TargetWidget(root), button_node(56.0), BackgroundColor(BTN_BG)))
                            .with_children(|l| {
                                l.spawn((Text::new("close"), text_14.clone(), TextColor(TEXT)));
                            });
                    });
                });

            // log
            panel.spawn((
                LogNode { shown: 0, font: font.clone() },
                TargetWidget(root),
                Node {
                    width: Val::Percent(100.0),
                    flex_grow: 1.0,
                    min_height: Val::Px(0.0),
                    flex_direction: FlexDirection::Column,
                    row_gap: Val::Px(8.0),
                    overflow: Overflow::scroll_y(),
                    ..default()
                },
                ScrollPosition::default(),
            ));

            // typing indicator
            panel.spawn((
                Text::new("typing..."),
                text_14.clone(),
                TextColor(META),
                TypingIndicator,
                TargetWidget(root),
                Node { display: Display::None, ..default() },
            ));

            // input row: > text [send]
            panel
                .spawn(Node {
                    width: Val::Percent(100.0),
                    flex_direction: FlexDirection::Row,
                    column_gap: Val::Px(8.0),
                    align_items: AlignItems::Center,
                    ..default()
                })
                .with_children(|row| {
                    row.spawn((
                        Text::new("> "),
                        text_14.clone(),
                        TextColor(TEXT),
                        InputText,
                        TargetWidget(root),
                        Node { flex_grow: 1.0, ..default() },
                    ));
                    row.spawn((Button, SendButton, TargetWidget(root), button_node(64.0), BackgroundColor(BTN_BG)))
                        .with_children(|l| {
                            l.spawn((
                                Text::new("send"),
                                text_14.clone(),
                                TextColor(TEXT),
                                SendLabel,
                                TargetWidget(root),
                            ));
                        });
                });
        });

        // --- toggle ---
        p.spawn((
            Button,
            ToggleButton,
            TargetWidget(root),
            Node {
                width: Val::Px(56.0),
                height: Val::Px(56.0),
                align_items: AlignItems::Center,
                justify_content: JustifyContent::Center,
                ..default()
            },
            BackgroundColor(TOGGLE_BG),
        ))
        .with_children(|l| {
            l.spawn((Text::new("chat"), text_14.clone(), TextColor(TEXT)));
        });
    });

    root
}

fn button_node(width: f32) -> Node {
    Node {
        width: Val::Px(width),
        height: Val::Px(28.0),
        align_items: AlignItems::Center,
        justify_content: JustifyContent::Center,
        ..default()
    }
}

/// panel size per state. closed hides the panel entirely.
pub fn layout_panel(node: &mut Node, panel: PanelState) {
    match panel {
        PanelState::Closed => node.display = Display::None,
        PanelState::OpenNormal => {
            node.display = Display::Flex;
            node.width = Val::Px(384.0);
            node.max_width = Val::Auto;
            node.height = Val::Px(520.0);
            node.max_height = Val::Vh(80.0);
        }
        PanelState::OpenExpanded => {
            node.display = Display::Flex;
            node.width = Val::Vw(95.0);
            node.max_width = Val::Px(1200.0);
            node.height = Val::Vh(90.0);
            node.max_height = Val::Vh(90.0);
        }
    }
}

// ---------------------- input ----------------------

/// toggle / close / expand / send buttons.
pub fn handle_buttons(
    mut commands: Commands,
    mut q_widgets: Query<&mut ChatWidget>,
    mut q_buttons: Query<
        (
            &Interaction,
            &TargetWidget,
            &mut BackgroundColor,
            Has<ToggleButton>,
            Has<CloseButton>,
            Has<ExpandButton>,
            Has<SendButton>,
        ),
        Changed<Interaction>,
    >,
) {
    for (i, TargetWidget(e), mut bg, toggle, close, expand, send) in &mut q_buttons {
        // toggle keeps its accent color
        if !toggle {
            bg.0 = match *i {
                Interaction::Pressed => BTN_PRESSED,
                Interaction::Hovered => BTN_HOVER,
                Interaction::None => BTN_BG,
            };
        }
        if *i != Interaction::Pressed {
            continue;
        }
        let Ok(mut widget) = q_widgets.get_mut(*e) else {
            continue;
        };
        if toggle || close {
            widget.toggle();
            debug!(target: "bevy_chat_widget", "panel -> {:?}", widget.panel);
        } else if expand {
            widget.expand();
            debug!(target: "bevy_chat_widget", "panel -> {:?}", widget.panel);
        } else if send && widget.accepts_input() {
            submit_input(&mut commands, *e, &mut widget);
        }
    }
}

/// a left press while open, with no part of the widget under the cursor,
/// closes the panel.
pub fn handle_outside_click(
    mouse: Res<ButtonInput<MouseButton>>,
    q_parts: Query<(&Interaction, &TargetWidget)>,
    mut q_widgets: Query<(Entity, &mut ChatWidget)>,
) {
    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    for (e, mut widget) in &mut q_widgets {
        if !widget.panel.is_open() {
            continue;
        }
        let inside = q_parts
            .iter()
            .any(|(i, TargetWidget(t))| *t == e && *i != Interaction::None);
        if !inside {
            widget.outside_click();
            debug!(target: "bevy_chat_widget", "outside click -> closed");
        }
    }
}

/// typed text goes to every open, idle widget (normally there is one).
/// enter submits, shift+enter inserts a newline.
pub fn handle_text_input(
    mut commands: Commands,
    mut ev_kbd: EventReader<KeyboardInput>,
    keys: Res<ButtonInput<KeyCode>>,
    mut q_widgets: Query<(Entity, &mut ChatWidget)>,
) {
    let pressed: Vec<KeyboardInput> = ev_kbd.read().filter(|ev| ev.state.is_pressed()).cloned().collect();
    if pressed.is_empty() {
        return;
    }
    let shift = keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);

    for (e, mut widget) in &mut q_widgets {
        if !widget.accepts_input() {
            continue;
        }
        for ev in &pressed {
            if !widget.accepts_input() {
                break;
            }
            match &ev.logical_key {
                Key::Enter if shift => widget.input.push('\n'),
                Key::Enter => {
                    submit_input(&mut commands, e, &mut widget);
                }
                Key::Backspace => {
                    widget.input.pop();
                }
                _ => {
                    if let Some(t) = &ev.text {
                        widget.input.extend(t.chars().filter(|c| !c.is_control()));
                    }
                }
            }
        }
    }
}

// ---------------------- presentation ----------------------

/// spawn nodes for log entries not yet shown and apply scroll requests.
pub fn sync_log_nodes(
    mut commands: Commands,
    mut q_log: Query<(Entity, &mut LogNode, &TargetWidget, &mut ScrollPosition)>,
    mut q_widgets: Query<&mut ChatWidget>,
) {
    for (log_e, mut node, TargetWidget(w), mut scroll) in &mut q_log {
        let Ok(mut widget) = q_widgets.get_mut(*w) else {
            continue;
        };
        let fresh = widget.log.since(node.shown);
        if !fresh.is_empty() {
            for entry in fresh {
                spawn_entry(&mut commands, log_e, entry, &widget.config.assistant_name, &node.font);
            }
            node.shown = widget.log.len();
        }
        if widget.bypass_change_detection().log.take_scroll_request() {
            // layout clamps this to the real maximum
            scroll.offset_y = f32::MAX;
        }
    }
}

fn spawn_entry(commands: &mut Commands, log: Entity, entry: &LogEntry, assistant_name: &str, font: &Handle<Font>) {
    let user = entry.message.sender == Sender::User;
    let body_font = TextFont { font: font.clone(), font_size: 15.0, ..default() };
    let meta_font = TextFont { font: font.clone(), font_size: 11.0, ..default() };
    let meta = meta_label(entry.message.sender, assistant_name);

    let row = commands
        .spawn(Node {
            width: Val::Percent(100.0),
            flex_direction: FlexDirection::Row,
            justify_content: if user { JustifyContent::FlexEnd } else { JustifyContent::FlexStart },
            ..default()
        })
        .with_children(|row| {
            row.spawn((
                Node {
                    max_width: Val::Percent(80.0),
                    flex_direction: FlexDirection::Column,
                    padding: UiRect::axes(Val::Px(16.0), Val::Px(12.0)),
                    ..default()
                },
                BackgroundColor(if user { USER_BG } else { ASSISTANT_BG }),
            ))
            .with_children(|bubble| {
                spawn_body(bubble, &entry.body, &body_font);
                bubble.spawn((
                    Text::new(meta),
                    meta_font,
                    TextColor(META),
                    Node { align_self: AlignSelf::FlexEnd, margin: UiRect::top(Val::Px(4.0)), ..default() },
                ));
            });
        })
        .id();
    commands.entity(log).add_child(row);
}

fn spawn_body(parent: &mut ChildSpawnerCommands, body: &Body, font: &TextFont) {
    match body {
        // literal text: no markup interpretation at all
        Body::Plain(text) => {
            parent.spawn((Text::new(text.clone()), font.clone(), TextColor(TEXT)));
        }
        Body::Markup(markup) => {
            parent
                .spawn((Text::default(), font.clone(), TextColor(TEXT)))
                .with_children(|spans| {
                    for f in &markup.fragments {
                        let (span, color) = match f {
                            Fragment::Text(s) => (TextSpan::new(s.clone()), TEXT),
                            Fragment::Link { label, .. } => (TextSpan::new(label.clone()), LINK),
                            Fragment::LineBreak => (TextSpan::new("\n"), TEXT),
                            Fragment::Pointer => (TextSpan::new("👉"), TEXT),
                        };
                        spans.spawn((span, font.clone(), TextColor(color)));
                    }
                });
        }
    }
}

pub fn apply_panel_layout(
    q_widgets: Query<Ref<ChatWidget>>,
    mut q_panel: Query<(&TargetWidget, &mut Node), With<PanelNode>>,
    mut q_typing: Query<(&TargetWidget, &mut Node), (With<TypingIndicator>, Without<PanelNode>)>,
) {
    for (TargetWidget(e), mut node) in &mut q_panel {
        if let Ok(w) = q_widgets.get(*e)
            && w.is_changed()
        {
            layout_panel(&mut node, w.panel);
        }
    }
    for (TargetWidget(e), mut node) in &mut q_typing {
        if let Ok(w) = q_widgets.get(*e)
            && w.is_changed()
        {
            node.display = if w.is_loading() { Display::Flex } else { Display::None };
        }
    }
}

pub fn refresh_labels(
    q_widgets: Query<Ref<ChatWidget>>,
    mut sets: ParamSet<(
        Query<(&TargetWidget, &mut Text), With<ExpandLabel>>,
        Query<(&TargetWidget, &mut Text), With<SendLabel>>,
        Query<(&TargetWidget, &mut Text), With<InputText>>,
    )>,
) {
    for (TargetWidget(e), mut t) in sets.p0().iter_mut() {
        if let Ok(w) = q_widgets.get(*e)
            && w.is_changed()
        {
            t.0 = if w.panel.is_expanded() { "compress" } else { "expand" }.to_string();
        }
    }
    for (TargetWidget(e), mut t) in sets.p1().iter_mut() {
        if let Ok(w) = q_widgets.get(*e)
            && w.is_changed()
        {
            t.0 = if w.is_loading() { "..." } else { "send" }.to_string();
        }
    }
    for (TargetWidget(e), mut t) in sets.p2().iter_mut() {
        if let Ok(w) = q_widgets.get(*e)
            && w.is_changed()
        {
            let caret = if w.accepts_input() { " |" } else { "" };
            t.0 = format!("> {}{}", w.input, caret);
        }
    }
}

/// the send button looks disabled while a send is in flight.
pub fn refresh_send_button(
    q_widgets: Query<Ref<ChatWidget>>,
    mut q_send: Query<(&TargetWidget, &Interaction, &mut BackgroundColor), With<SendButton>>,
) {
    for (TargetWidget(e), i, mut bg) in &mut q_send {
        if let Ok(w) = q_widgets.get(*e)
            && w.is_changed()
        {
            bg.0 = match (w.is_loading(), *i) {
                (true, _) => BTN_DISABLED,
                (false, Interaction::Hovered) => BTN_HOVER,
                (false, _) => BTN_BG,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SendRequest;
    use crate::message::Message;
    use bevy::input::mouse::MouseButtonInput;
    use bevy::input::{ButtonState, InputPlugin};

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, InputPlugin));
        app.add_systems(Update, (handle_outside_click, sync_log_nodes, apply_panel_layout).chain());
        app
    }

    fn spawn(app: &mut App) -> Entity {
        let world = app.world_mut();
        let e = {
            let mut commands = world.commands();
            spawn_chat_widget(&mut commands, WidgetConfig::default(), Handle::default())
        };
        world.flush();
        e
    }

    // goes through the input plugin so `just_pressed` survives its clear
    fn left_press(app: &mut App) {
        app.world_mut().send_event(MouseButtonInput {
            button: MouseButton::Left,
            state: ButtonState::Pressed,
            window: Entity::PLACEHOLDER,
        });
    }

    fn panel_display(app: &mut App) -> Display {
        let mut q = app.world_mut().query_filtered::<&Node, With<PanelNode>>();
        q.iter(app.world()).next().expect("panel").display
    }

    fn input_app() -> (App, Entity) {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, InputPlugin));
        app.add_systems(Update, (handle_buttons, handle_text_input).chain());
        let e = spawn(&mut app);
        (app, e)
    }

    fn key(app: &mut App, key_code: KeyCode, logical_key: Key, text: Option<&str>, state: ButtonState) {
        app.world_mut().send_event(KeyboardInput {
            key_code,
            logical_key,
            state,
            text: text.map(Into::into),
            repeat: false,
            window: Entity::PLACEHOLDER,
        });
    }

    fn type_char(app: &mut App, c: &str) {
        key(app, KeyCode::KeyA, Key::Character(c.into()), Some(c), ButtonState::Pressed);
    }

    fn widget(app: &mut App, e: Entity) -> Mut<'_, ChatWidget> {
        app.world_mut().get_mut::<ChatWidget>(e).unwrap()
    }

    fn press_send(app: &mut App) {
        let mut q = app.world_mut().query_filtered::<Entity, With<SendButton>>();
        let send = q.iter(app.world()).next().expect("send button");
        app.world_mut().entity_mut(send).insert(Interaction::Pressed);
    }

    #[test]
    fn layout_follows_panel_state() {
        let mut n = Node::default();
        layout_panel(&mut n, PanelState::OpenNormal);
        assert_eq!(n.display, Display::Flex);
        assert_eq!(n.width, Val::Px(384.0));
        layout_panel(&mut n, PanelState::OpenExpanded);
        assert_eq!(n.width, Val::Vw(95.0));
        assert_eq!(n.max_width, Val::Px(1200.0));
        layout_panel(&mut n, PanelState::Closed);
        assert_eq!(n.display, Display::None);
    }

    #[test]
    fn spawned_widget_starts_closed_and_requests_history() {
        let mut app = app();
        let e = spawn(&mut app);
        app.update();
        assert_eq!(app.world().get::<ChatWidget>(e).unwrap().panel, PanelState::Closed);
        assert!(app.world().get::<HistoryRequest>(e).is_some());
        assert_eq!(panel_display(&mut app), Display::None);

        app.world_mut().get_mut::<ChatWidget>(e).unwrap().toggle();
        app.update();
        assert_eq!(panel_display(&mut app), Display::Flex);
    }

    #[test]
    fn log_nodes_follow_the_log() {
        let mut app = app();
        let e = spawn(&mut app);
        {
            let mut w = app.world_mut().get_mut::<ChatWidget>(e).unwrap();
            w.render(Message::user("hi"));
            w.render(Message::assistant("see [docs](http://x)"));
        }
        app.update();

        let mut q = app.world_mut().query::<(&LogNode, &Children, &ScrollPosition)>();
        let (node, children, scroll) = q.iter(app.world()).next().expect("log node");
        assert_eq!(node.shown, 2);
        assert_eq!(children.len(), 2);
        assert!(scroll.offset_y > 0.0);

        let mut spans = app.world_mut().query::<&TextSpan>();
        let texts: Vec<String> = spans.iter(app.world()).map(|s| s.0.clone()).collect();
        assert!(texts.contains(&"docs".to_string()));
        assert!(!texts.iter().any(|t| t.contains("http://x")));

        app.update();
        let mut q = app.world_mut().query::<(&LogNode, &Children)>();
        let (_, children) = q.iter(app.world()).next().expect("log node");
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn outside_click_closes_open_panel() {
        let mut app = app();
        let e = spawn(&mut app);
        app.world_mut().get_mut::<ChatWidget>(e).unwrap().toggle();
        app.update();

        left_press(&mut app);
        app.update();

        assert_eq!(app.world().get::<ChatWidget>(e).unwrap().panel, PanelState::Closed);
        assert_eq!(panel_display(&mut app), Display::None);
    }

    #[test]
    fn click_on_widget_does_not_close() {
        let mut app = app();
        let e = spawn(&mut app);
        app.world_mut().get_mut::<ChatWidget>(e).unwrap().toggle();
        app.update();

        let mut q = app.world_mut().query_filtered::<Entity, With<PanelNode>>();
        let panel = q.iter(app.world()).next().expect("panel");
        app.world_mut().entity_mut(panel).insert(Interaction::Hovered);
        left_press(&mut app);
        app.update();

        assert_eq!(app.world().get::<ChatWidget>(e).unwrap().panel, PanelState::OpenNormal);
    }

    #[test]
    fn typing_edits_input_and_enter_submits() {
        let (mut app, e) = input_app();
        widget(&mut app, e).toggle();

        for c in ["h", "i", "!"] {
            type_char(&mut app, c);
        }
        key(&mut app, KeyCode::Backspace, Key::Backspace, None, ButtonState::Pressed);
        app.update();
        assert_eq!(widget(&mut app, e).input, "hi");

        key(&mut app, KeyCode::ShiftLeft, Key::Shift, None, ButtonState::Pressed);
        key(&mut app, KeyCode::Enter, Key::Enter, Some("\r"), ButtonState::Pressed);
        app.update();
        assert_eq!(widget(&mut app, e).input, "hi\n");
        assert!(app.world().get::<SendRequest>(e).is_none());

        key(&mut app, KeyCode::ShiftLeft, Key::Shift, None, ButtonState::Released);
        type_char(&mut app, "x");
        key(&mut app, KeyCode::Enter, Key::Enter, Some("\r"), ButtonState::Pressed);
        app.update();

        let w = app.world().get::<ChatWidget>(e).unwrap();
        assert!(w.is_loading());
        assert!(w.input.is_empty());
        assert_eq!(w.log.len(), 1);
        assert_eq!(app.world().get::<SendRequest>(e).expect("queued").text, "hi\nx");
    }

    #[test]
    fn input_is_ignored_while_closed_or_loading() {
        let (mut app, e) = input_app();
        type_char(&mut app, "a");
        app.update();
        assert!(widget(&mut app, e).input.is_empty());

        {
            let mut w = widget(&mut app, e);
            w.toggle();
            w.begin_submit("first");
        }
        type_char(&mut app, "b");
        key(&mut app, KeyCode::Enter, Key::Enter, Some("\r"), ButtonState::Pressed);
        app.update();

        let w = app.world().get::<ChatWidget>(e).unwrap();
        assert!(w.input.is_empty());
        assert_eq!(w.log.len(), 1);
        assert!(app.world().get::<SendRequest>(e).is_none());
    }

    #[test]
    fn send_button_is_inert_while_loading() {
        let (mut app, e) = input_app();
        {
            let mut w = widget(&mut app, e);
            w.toggle();
            w.begin_submit("first");
            w.input = "again".into();
        }
        press_send(&mut app);
        app.update();
        assert!(app.world().get::<SendRequest>(e).is_none());
        assert_eq!(widget(&mut app, e).input, "again");
        assert_eq!(widget(&mut app, e).log.len(), 1);

        widget(&mut app, e).finish_submit(Ok(crate::SendReply::Success { ai_message: "ok".into() }));
        press_send(&mut app);
        app.update();
        assert_eq!(app.world().get::<SendRequest>(e).expect("queued").text, "again");
        assert_eq!(widget(&mut app, e).log.len(), 3);
    }

    #[test]
    fn toggle_and_close_buttons_drive_the_panel() {
        let (mut app, e) = input_app();
        let mut q = app.world_mut().query_filtered::<Entity, With<ToggleButton>>();
        let toggle = q.iter(app.world()).next().expect("toggle");
        let mut q = app.world_mut().query_filtered::<Entity, With<CloseButton>>();
        let close = q.iter(app.world()).next().expect("close");

        app.world_mut().entity_mut(toggle).insert(Interaction::Pressed);
        app.update();
        assert_eq!(widget(&mut app, e).panel, PanelState::OpenNormal);

        app.world_mut().entity_mut(close).insert(Interaction::Pressed);
        app.update();
        assert_eq!(widget(&mut app, e).panel, PanelState::Closed);
    }
}
