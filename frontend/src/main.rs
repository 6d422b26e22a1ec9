use std::rc::Rc;

use shared::chat::{ChatEvent, Conversation, Role};
use shared::transport::DEFAULT_TIMEOUT_SECS;
use web_sys::HtmlTextAreaElement;
use yew::prelude::*;

mod rpc;

const API_URL: &str = match option_env!("JEDI_API_URL") {
    Some(url) => url,
    None => "http://localhost:3000",
};

#[derive(Default)]
struct ChatState(Conversation);

impl Reducible for ChatState {
    type Action = ChatEvent;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut conversation = self.0.clone();
        conversation.apply(action);
        Rc::new(ChatState(conversation))
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Jedi Master",
    }
}

#[function_component]
fn App() -> Html {
    let chat = use_reducer(ChatState::default);
    let input = use_state(String::new);

    let send = {
        let chat = chat.clone();
        let input = input.clone();

        Callback::from(move |prompt: String| {
            if !chat.0.can_send() || prompt.trim().is_empty() {
                return;
            }

            chat.dispatch(ChatEvent::Submit(prompt));
            input.set(String::new());
        })
    };

    // One request per submission the reducer accepted.
    {
        let chat = chat.clone();
        let submission = chat.0.submission_id();

        use_effect_with_deps(
            move |_| {
                if let Some(prompt) = chat.0.in_flight().map(str::to_string) {
                    let chat = chat.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let client = rpc::Client::new(API_URL);
                        let outcome =
                            rpc::ask_with_timeout(&client, &prompt, DEFAULT_TIMEOUT_SECS).await;
                        chat.dispatch(ChatEvent::Resolved(outcome));
                    });
                }
                || ()
            },
            submission,
        );
    }

    let oninput = {
        let input = input.clone();

        Callback::from(move |e: InputEvent| {
            let textarea: HtmlTextAreaElement = e.target_unchecked_into();
            input.set(textarea.value());
        })
    };

    let onkeydown = {
        let send = send.clone();
        let input = input.clone();

        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" && !e.shift_key() {
                e.prevent_default();
                send.emit((*input).clone());
            }
        })
    };

    let onclick = {
        let send = send.clone();
        let input = input.clone();

        Callback::from(move |_: MouseEvent| send.emit((*input).clone()))
    };

    let retry = {
        let chat = chat.clone();
        let input = input.clone();

        Callback::from(move |_: MouseEvent| {
            if let Some(prompt) = chat.0.retry_prompt() {
                input.set(prompt.to_string());
                send.emit(prompt.to_string());
            }
        })
    };

    let clear = {
        let chat = chat.clone();

        Callback::from(move |_: MouseEvent| chat.dispatch(ChatEvent::Clear))
    };

    let conversation = &chat.0;

    html! {
        <div class="container">
            <h1>{ "Jedi GPT" }</h1>
            <ul class="messages">
                { for conversation.messages().iter().map(|message| html! {
                    <li key={message.id.to_string()} class={classes!("message", format!("{:?}", message.role).to_lowercase())}>
                        <strong>{ role_label(message.role) }</strong>
                        <p>{ message.text.clone() }</p>
                    </li>
                }) }
            </ul>
            if conversation.is_submitting() {
                <p class="thinking">{ "The Jedi Master is meditating..." }</p>
            }
            if let Some(error) = conversation.error() {
                <div class="error">
                    <p>{ format!("⚠️ {}", error.message) }</p>
                    if let Some(details) = error.details.clone() {
                        <pre>{ details }</pre>
                    }
                    <button onclick={retry}>{ "Try again" }</button>
                </div>
            }
            <textarea
                placeholder="Ask the Jedi Master..."
                value={(*input).clone()}
                {oninput}
                {onkeydown}
                rows="4"
            />
            <button {onclick} disabled={!conversation.can_send()}>
                { if conversation.is_submitting() { "Thinking..." } else { "Ask" } }
            </button>
            if conversation.can_clear() {
                <button onclick={clear}>{ "Clear" }</button>
            }
            <footer>{ "Powered by Azure OpenAI & Container Apps" }</footer>
        </div>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
