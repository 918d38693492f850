use macroquad::prelude::*;
use std::path::Path;
use tilers::agent::{Agent, LookAheadAgent};
use tilers::config::AppConfig;
use tilers::game::{Game, Move, ACTIONS};

const SCORE_AREA_HEIGHT: f32 = 60.0;
const SCORE_TEXT_SIZE: f32 = 32.0;
const BOARD_SIZE_PX: i32 = 480;
const AGENT_TICK_SPEED: f32 = 0.15; // seconds

fn window_conf() -> Conf {
    Conf {
        window_title: "tilers".to_owned(),
        window_width: BOARD_SIZE_PX,
        window_height: (SCORE_AREA_HEIGHT as i32) + BOARD_SIZE_PX,
        window_resizable: false,
        ..Default::default()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Screen {
    Menu,
    Human,
    Agent,
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load_or_default(Path::new("tilers.toml")).unwrap_or_else(|e| {
        log::error!("{}, using defaults", e);
        AppConfig::default()
    });
    let size = config.game.size;

    let mut screen = Screen::Menu;
    let mut time_accumulator: f32 = 0.0; // seconds

    let mut game = Game::new(size);
    let mut agent = LookAheadAgent::new(size * size, ACTIONS, &config.agent, config.lookahead.clone());

    loop {
        clear_background(Color::new(0.98, 0.97, 0.94, 1.0));

        match screen {
            Screen::Menu => {
                if let Some(choice) = draw_menu() {
                    game.reset();
                    time_accumulator = 0.0;
                    screen = choice;
                }
            }
            Screen::Human => {
                if let Some(mv) = pressed_move() {
                    game.step(mv.index());
                }
                game.draw(SCORE_AREA_HEIGHT, SCORE_TEXT_SIZE);
                if !game.alive() {
                    screen = Screen::Menu;
                }
            }
            Screen::Agent => {
                time_accumulator += get_frame_time();
                while game.alive() && time_accumulator >= AGENT_TICK_SPEED {
                    time_accumulator -= AGENT_TICK_SPEED;

                    let action = agent.get_action(&game);
                    let (reward, _) = game.step(action);
                    agent.give_reward(reward);
                }

                game.draw(SCORE_AREA_HEIGHT, SCORE_TEXT_SIZE);
                if !game.alive() {
                    // the agent keeps learning from what it watched itself play
                    agent.learn();
                    if let Err(e) = agent.save() {
                        log::warn!("{}", e);
                    }
                    screen = Screen::Menu;
                }
            }
        }

        next_frame().await
    }
}

struct Button {
    rect: Rect,
    text: &'static str,
}

impl Button {
    fn new(x: f32, y: f32, w: f32, h: f32, text: &'static str) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
            text,
        }
    }

    fn draw_and_check_click(&self) -> bool {
        let mouse_pos = mouse_position();
        let mouse_over = self.rect.contains(vec2(mouse_pos.0, mouse_pos.1));

        let color = if mouse_over {
            Color::from_rgba(143, 122, 102, 255)
        } else {
            Color::from_rgba(119, 110, 101, 255)
        };

        draw_rectangle(self.rect.x, self.rect.y, self.rect.w, self.rect.h, color);
        let text_dims = measure_text(self.text, None, 30, 1.0);
        let text_x = self.rect.x + (self.rect.w - text_dims.width) / 2.0;
        let text_y = self.rect.y + (self.rect.h - text_dims.height) / 2.0 + text_dims.offset_y;
        draw_text(self.text, text_x, text_y, 30.0, WHITE);
        mouse_over && is_mouse_button_pressed(MouseButton::Left)
    }
}

fn draw_menu() -> Option<Screen> {
    let center_x = screen_width() / 2.0;
    let center_y = screen_height() / 2.0;
    let button_width = 250.0;
    let button_height = 60.0;
    let spacing = 20.0;

    let human_button = Button::new(
        center_x - button_width / 2.0,
        center_y - button_height - spacing / 2.0,
        button_width,
        button_height,
        "Human Player"
    );

    let agent_button = Button::new(
        center_x - button_width / 2.0,
        center_y + spacing / 2.0,
        button_width,
        button_height,
        "RL Agent"
    );

    let title = "Select Player";
    let title_dims = measure_text(title, None, 50, 1.0);
    draw_text(title, center_x - title_dims.width / 2.0, center_y - 100.0, 50.0, BLACK);

    if human_button.draw_and_check_click() {
        return Some(Screen::Human);
    }
    if agent_button.draw_and_check_click() {
        return Some(Screen::Agent);
    }
    None
}

// WASD or arrow keys
fn pressed_move() -> Option<Move> {
    if is_key_pressed(KeyCode::Up) || is_key_pressed(KeyCode::W) {
        Some(Move::Up)
    } else if is_key_pressed(KeyCode::Down) || is_key_pressed(KeyCode::S) {
        Some(Move::Down)
    } else if is_key_pressed(KeyCode::Right) || is_key_pressed(KeyCode::D) {
        Some(Move::Right)
    } else if is_key_pressed(KeyCode::Left) || is_key_pressed(KeyCode::A) {
        Some(Move::Left)
    } else {
        None
    }
}
